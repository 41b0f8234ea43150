//! Storefront home: navbar, categories, product grid.

use super::{open, CartPage, LoginModal, PageObject, ProductPage, SignupModal};
use crate::result::VigiaResult;
use crate::wait::Waiter;

pub mod locators {
    //! Home page selectors
    use crate::locator::{css, id, Locator};

    /// Brand link in the navbar
    pub fn brand() -> Locator {
        id("nava").named("store brand")
    }

    /// Product cards in the grid
    pub fn product_cards() -> Locator {
        css("#tbodyid .card").named("product cards")
    }

    /// Product title links
    pub fn product_titles() -> Locator {
        css("#tbodyid .card-title a").named("product titles")
    }

    /// Title link of one product
    pub fn product_link(name: &str) -> Locator {
        css("#tbodyid .card-title a")
            .with_text(name)
            .named(format!("product link '{name}'"))
    }

    /// Sidebar category entry (Phones, Laptops, Monitors)
    pub fn category(name: &str) -> Locator {
        css("#itemc").with_text(name).named(format!("category '{name}'"))
    }

    /// Navbar cart link
    pub fn cart_link() -> Locator {
        id("cartur").named("cart link")
    }

    /// Navbar log-in link
    pub fn login_link() -> Locator {
        id("login2").named("log in link")
    }

    /// Navbar sign-up link
    pub fn signup_link() -> Locator {
        id("signin2").named("sign up link")
    }

    /// "Welcome <user>" shown after logging in
    pub fn user_name() -> Locator {
        id("nameofuser").named("logged-in user")
    }

    /// Navbar log-out link
    pub fn logout_link() -> Locator {
        id("logout2").named("log out link")
    }
}

/// Storefront landing page
#[derive(Debug, Clone)]
pub struct HomePage<'s> {
    waiter: Waiter<'s>,
    url: String,
}

impl<'s> HomePage<'s> {
    /// Page at `url` (the storefront root)
    #[must_use]
    pub fn new(waiter: Waiter<'s>, url: impl Into<String>) -> Self {
        Self {
            waiter,
            url: url.into(),
        }
    }

    /// Navigate to the home page and wait for the product grid
    pub fn open(&self) -> VigiaResult<()> {
        open(&self.waiter, &self.url, self)
    }

    /// Titles currently in the grid, once at least one is shown
    pub fn product_titles(&self) -> VigiaResult<Vec<String>> {
        self.waiter
            .until_count_at_least(&locators::product_titles(), 1)?;
        self.waiter.session().texts(&locators::product_titles())
    }

    /// Filter by category and return the refreshed titles
    pub fn select_category(&self, name: &str) -> VigiaResult<Vec<String>> {
        let before = self.waiter.session().texts(&locators::product_titles())?;
        let category = locators::category(name);
        self.waiter.until_clickable(&category)?;
        self.waiter.session().click(&category)?;

        let mut refreshed = Vec::new();
        self.waiter.until_condition(
            &format!("product grid to refresh for '{name}'"),
            |session| {
                let titles = session.texts(&locators::product_titles())?;
                let changed = !titles.is_empty() && titles != before;
                if changed {
                    refreshed = titles;
                }
                Ok(changed)
            },
        )?;
        Ok(refreshed)
    }

    /// Open a product's detail page
    pub fn open_product(&self, name: &str) -> VigiaResult<ProductPage<'s>> {
        let link = locators::product_link(name);
        self.waiter.until_clickable(&link)?;
        self.waiter.session().click(&link)?;
        let page = ProductPage::new(self.waiter);
        page.wait_until_ready()?;
        Ok(page)
    }

    /// Go to the cart
    pub fn open_cart(&self) -> VigiaResult<CartPage<'s>> {
        self.waiter.until_clickable(&locators::cart_link())?;
        self.waiter.session().click(&locators::cart_link())?;
        let page = CartPage::new(self.waiter);
        page.wait_until_ready()?;
        Ok(page)
    }

    /// Open the log-in modal
    pub fn open_login(&self) -> VigiaResult<LoginModal<'s>> {
        self.waiter.until_clickable(&locators::login_link())?;
        self.waiter.session().click(&locators::login_link())?;
        let modal = LoginModal::new(self.waiter);
        modal.wait_until_ready()?;
        Ok(modal)
    }

    /// Open the sign-up modal
    pub fn open_signup(&self) -> VigiaResult<SignupModal<'s>> {
        self.waiter.until_clickable(&locators::signup_link())?;
        self.waiter.session().click(&locators::signup_link())?;
        let modal = SignupModal::new(self.waiter);
        modal.wait_until_ready()?;
        Ok(modal)
    }

    /// Wait for the "Welcome <user>" greeting and return it
    pub fn logged_in_user(&self) -> VigiaResult<String> {
        self.waiter
            .until_text_contains(&locators::user_name(), "Welcome")
    }
}

impl PageObject for HomePage<'_> {
    fn page_name(&self) -> &str {
        "home"
    }

    fn url_pattern(&self) -> &str {
        "/"
    }

    fn wait_until_ready(&self) -> VigiaResult<()> {
        self.waiter.all(&[
            &|w: &Waiter<'_>| w.until_page_ready().map(|_| ()),
            &|w: &Waiter<'_>| w.until_title_contains("STORE").map(|_| ()),
            &|w: &Waiter<'_>| w.until_visible(&locators::product_cards()).map(|_| ()),
        ])
    }
}
