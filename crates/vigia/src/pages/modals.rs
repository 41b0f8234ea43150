//! Log-in, sign-up and order modals.

use super::{parse_price, PageObject};
use crate::locator::Locator;
use crate::result::{VigiaError, VigiaResult};
use crate::wait::Waiter;

pub mod locators {
    //! Modal selectors
    use crate::locator::{css, id, Locator};

    /// Log-in modal container
    pub fn login_modal() -> Locator {
        id("logInModal").named("log in modal")
    }

    /// Log-in username field
    pub fn login_username() -> Locator {
        id("loginusername").named("log in username")
    }

    /// Log-in password field
    pub fn login_password() -> Locator {
        id("loginpassword").named("log in password")
    }

    /// Log-in submit button
    pub fn login_submit() -> Locator {
        css("#logInModal button.btn-primary")
            .with_text("Log in")
            .named("log in button")
    }

    /// Log-in close button
    pub fn login_close() -> Locator {
        css("#logInModal button.btn-secondary")
            .with_text("Close")
            .named("log in close button")
    }

    /// Sign-up modal container
    pub fn signup_modal() -> Locator {
        id("signInModal").named("sign up modal")
    }

    /// Sign-up username field
    pub fn signup_username() -> Locator {
        id("sign-username").named("sign up username")
    }

    /// Sign-up password field
    pub fn signup_password() -> Locator {
        id("sign-password").named("sign up password")
    }

    /// Sign-up submit button
    pub fn signup_submit() -> Locator {
        css("#signInModal button.btn-primary")
            .with_text("Sign up")
            .named("sign up button")
    }

    /// Order modal container
    pub fn order_modal() -> Locator {
        id("orderModal").named("order modal")
    }

    /// Order form field by id (name, country, city, card, month, year)
    pub fn order_field(field: &str) -> Locator {
        id(field).named(format!("order {field} field"))
    }

    /// Purchase button
    pub fn purchase() -> Locator {
        css("#orderModal button.btn-primary")
            .with_text("Purchase")
            .named("purchase button")
    }

    /// Confirmation dialog
    pub fn confirmation() -> Locator {
        css(".sweet-alert").named("purchase confirmation")
    }

    /// Confirmation heading
    pub fn confirmation_heading() -> Locator {
        css(".sweet-alert h2").named("confirmation heading")
    }

    /// Confirmation details (id, amount, card, name, date)
    pub fn confirmation_details() -> Locator {
        css(".sweet-alert p.lead").named("confirmation details")
    }

    /// Confirmation OK button
    pub fn confirmation_ok() -> Locator {
        css(".sweet-alert button.confirm").named("confirmation OK button")
    }
}

fn fill_visible(waiter: &Waiter<'_>, field: &Locator, value: &str) -> VigiaResult<()> {
    waiter.until_clickable(field)?;
    waiter.session().fill(field, value)
}

fn click_when_ready(waiter: &Waiter<'_>, button: &Locator) -> VigiaResult<()> {
    waiter.until_clickable(button)?;
    waiter.session().click(button)
}

// ============================================================================
// Log in
// ============================================================================

/// Log-in modal
#[derive(Debug, Clone)]
pub struct LoginModal<'s> {
    waiter: Waiter<'s>,
}

impl<'s> LoginModal<'s> {
    /// Wrap the open modal
    #[must_use]
    pub const fn new(waiter: Waiter<'s>) -> Self {
        Self { waiter }
    }

    /// Submit credentials; the modal closes on success
    ///
    /// # Errors
    ///
    /// [`VigiaError::Assertion`] carrying the site's alert text when the
    /// credentials are rejected.
    pub fn login(&self, username: &str, password: &str) -> VigiaResult<()> {
        fill_visible(&self.waiter, &locators::login_username(), username)?;
        fill_visible(&self.waiter, &locators::login_password(), password)?;
        click_when_ready(&self.waiter, &locators::login_submit())?;

        let quick = self.waiter.quick()?;
        let mut rejected = None;
        quick.until_condition("log in to complete", |session| {
            if let Some(alert) = session.take_alert()? {
                rejected = Some(alert);
                return Ok(true);
            }
            match session.element_state(&locators::login_modal()) {
                Ok(state) => Ok(!state.visible),
                Err(VigiaError::ElementNotFound { .. }) => Ok(true),
                Err(e) => Err(e),
            }
        })?;
        match rejected {
            Some(alert) => Err(VigiaError::assertion(format!("log in rejected: {alert}"))),
            None => Ok(()),
        }
    }

    /// Close without logging in
    pub fn close(&self) -> VigiaResult<()> {
        click_when_ready(&self.waiter, &locators::login_close())?;
        self.waiter.until_invisible(&locators::login_modal())
    }
}

impl PageObject for LoginModal<'_> {
    fn page_name(&self) -> &str {
        "log in modal"
    }

    fn url_pattern(&self) -> &str {
        "#logInModal"
    }

    fn wait_until_ready(&self) -> VigiaResult<()> {
        self.waiter.all(&[
            &|w: &Waiter<'_>| w.until_visible(&locators::login_modal()).map(|_| ()),
            &|w: &Waiter<'_>| w.until_clickable(&locators::login_username()).map(|_| ()),
        ])
    }
}

// ============================================================================
// Sign up
// ============================================================================

/// Sign-up modal
#[derive(Debug, Clone)]
pub struct SignupModal<'s> {
    waiter: Waiter<'s>,
}

impl<'s> SignupModal<'s> {
    /// Wrap the open modal
    #[must_use]
    pub const fn new(waiter: Waiter<'s>) -> Self {
        Self { waiter }
    }

    /// Register and return the site's alert ("Sign up successful.")
    pub fn signup(&self, username: &str, password: &str) -> VigiaResult<String> {
        fill_visible(&self.waiter, &locators::signup_username(), username)?;
        fill_visible(&self.waiter, &locators::signup_password(), password)?;
        click_when_ready(&self.waiter, &locators::signup_submit())?;
        self.waiter.until_alert()
    }
}

impl PageObject for SignupModal<'_> {
    fn page_name(&self) -> &str {
        "sign up modal"
    }

    fn url_pattern(&self) -> &str {
        "#signInModal"
    }

    fn wait_until_ready(&self) -> VigiaResult<()> {
        self.waiter.all(&[
            &|w: &Waiter<'_>| w.until_visible(&locators::signup_modal()).map(|_| ()),
            &|w: &Waiter<'_>| w.until_clickable(&locators::signup_username()).map(|_| ()),
        ])
    }
}

// ============================================================================
// Order
// ============================================================================

/// Order form values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDetails {
    /// Buyer name
    pub name: String,
    /// Country
    pub country: String,
    /// City
    pub city: String,
    /// Card number
    pub card: String,
    /// Card expiry month
    pub month: String,
    /// Card expiry year
    pub year: String,
}

impl Default for OrderDetails {
    fn default() -> Self {
        Self {
            name: "Ada Lovelace".into(),
            country: "United Kingdom".into(),
            city: "London".into(),
            card: "4111111111111111".into(),
            month: "12".into(),
            year: "2030".into(),
        }
    }
}

/// Parsed purchase confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderConfirmation {
    /// "Thank you for your purchase!"
    pub heading: String,
    /// Order id
    pub id: String,
    /// Charged amount in dollars
    pub amount: u32,
    /// Name as echoed back
    pub name: String,
}

impl OrderConfirmation {
    /// Parse the details paragraph ("Id: 1\nAmount: 360 USD\n...")
    pub fn parse(heading: impl Into<String>, details: &str) -> VigiaResult<Self> {
        let field = |key: &str| {
            details
                .lines()
                .find_map(|line| line.trim().strip_prefix(key))
                .map(|v| v.trim().to_string())
                .ok_or_else(|| VigiaError::assertion(format!("confirmation lacks '{key}'")))
        };
        Ok(Self {
            heading: heading.into(),
            id: field("Id:")?,
            amount: parse_price(&field("Amount:")?)?,
            name: field("Name:")?,
        })
    }
}

/// Order modal opened from the cart
#[derive(Debug, Clone)]
pub struct OrderModal<'s> {
    waiter: Waiter<'s>,
}

impl<'s> OrderModal<'s> {
    /// Wrap the open modal
    #[must_use]
    pub const fn new(waiter: Waiter<'s>) -> Self {
        Self { waiter }
    }

    /// Fill every field
    pub fn fill(&self, details: &OrderDetails) -> VigiaResult<()> {
        for (field, value) in [
            ("name", &details.name),
            ("country", &details.country),
            ("city", &details.city),
            ("card", &details.card),
            ("month", &details.month),
            ("year", &details.year),
        ] {
            fill_visible(&self.waiter, &locators::order_field(field), value)?;
        }
        Ok(())
    }

    /// Purchase and read the confirmation
    pub fn purchase(&self) -> VigiaResult<OrderConfirmation> {
        click_when_ready(&self.waiter, &locators::purchase())?;
        let heading = self
            .waiter
            .until_text_contains(&locators::confirmation_heading(), "Thank you")?;
        let details = self
            .waiter
            .until_text_contains(&locators::confirmation_details(), "Amount")?;
        OrderConfirmation::parse(heading, &details)
    }

    /// Dismiss the confirmation
    pub fn confirm(&self) -> VigiaResult<()> {
        click_when_ready(&self.waiter, &locators::confirmation_ok())?;
        self.waiter.until_invisible(&locators::confirmation())
    }
}

impl PageObject for OrderModal<'_> {
    fn page_name(&self) -> &str {
        "order modal"
    }

    fn url_pattern(&self) -> &str {
        "#orderModal"
    }

    fn wait_until_ready(&self) -> VigiaResult<()> {
        self.waiter.all(&[
            &|w: &Waiter<'_>| w.until_visible(&locators::order_modal()).map(|_| ()),
            &|w: &Waiter<'_>| w.until_clickable(&locators::order_field("name")).map(|_| ()),
            &|w: &Waiter<'_>| w.until_clickable(&locators::purchase()).map(|_| ()),
        ])
    }
}
