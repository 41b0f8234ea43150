//! Demoblaze storefront scenarios.
//!
//! With `browser: scripted` the session is the offline storefront model, so
//! the feature runs without network or Chromium.

use crate::config::{EnvironmentConfig, Timeouts};
use crate::driver::{BrowserKind, DriverConfig, DriverManager, SessionGuard};
use crate::offline;
use crate::pages::locators::cart as cart_locators;
use crate::pages::{CartPage, HomePage, OrderConfirmation, OrderDetails, PageObject, ProductPage};
use crate::result::{VigiaError, VigiaResult};
use crate::scenario::{ensure, ensure_eq, Feature, Scenario, World};
use crate::session::BrowserSession;
use crate::wait::Waiter;

/// One browser session plus what earlier steps observed
#[derive(Debug)]
pub struct StorefrontWorld {
    manager: DriverManager,
    browser: Option<SessionGuard>,
    timeouts: Timeouts,
    home_url: String,
    alert: Option<String>,
    titles: Vec<String>,
    confirmation: Option<OrderConfirmation>,
}

impl StorefrontWorld {
    fn browser(&self) -> VigiaResult<&dyn BrowserSession> {
        self.browser
            .as_ref()
            .map(SessionGuard::session)
            .ok_or_else(|| VigiaError::browser("session already released"))
    }

    /// Waiter on the configured default tier
    pub fn waiter(&self) -> VigiaResult<Waiter<'_>> {
        Waiter::from_timeouts(self.browser()?, &self.timeouts)
    }

    /// Home page view (does not navigate)
    pub fn home(&self) -> VigiaResult<HomePage<'_>> {
        Ok(HomePage::new(self.waiter()?, self.home_url.as_str()))
    }

    /// Navigate home with the driver's retry policy and wait until ready
    pub fn open_home(&self) -> VigiaResult<HomePage<'_>> {
        self.manager.navigate(self.browser()?, &self.home_url)?;
        let home = self.home()?;
        home.wait_until_ready()?;
        Ok(home)
    }

    /// Current page viewed as the cart
    pub fn cart(&self) -> VigiaResult<CartPage<'_>> {
        Ok(CartPage::new(self.waiter()?))
    }

    /// Current page viewed as a product page
    pub fn product(&self) -> VigiaResult<ProductPage<'_>> {
        Ok(ProductPage::new(self.waiter()?))
    }

    fn add_to_cart(&mut self, name: &str) -> VigiaResult<()> {
        let alert = self.open_home()?.open_product(name)?.add_to_cart()?;
        self.alert = Some(alert);
        Ok(())
    }
}

impl World for StorefrontWorld {
    fn setup(config: &EnvironmentConfig) -> VigiaResult<Self> {
        let manager =
            DriverManager::new(DriverConfig::from_env(config)).with_scripted(offline::storefront);
        let browser = manager.launch()?;
        Ok(Self {
            manager,
            browser: Some(browser),
            timeouts: config.timeouts,
            home_url: config.storefront("/"),
            alert: None,
            titles: Vec::new(),
            confirmation: None,
        })
    }

    fn teardown(&mut self) -> VigiaResult<()> {
        match self.browser.take() {
            Some(browser) => browser.quit(),
            None => Ok(()),
        }
    }

    fn session(&self) -> Option<&dyn BrowserSession> {
        self.browser.as_ref().map(SessionGuard::session)
    }
}

fn scenario(name: &str) -> Scenario<StorefrontWorld> {
    Scenario::new(name).tag("ui")
}

fn home_is_open(w: &mut StorefrontWorld) -> VigiaResult<()> {
    w.open_home().map(|_| ())
}

/// The Demoblaze feature
#[must_use]
pub fn feature() -> Feature<StorefrontWorld> {
    Feature::new("Demoblaze storefront")
        .scenario(
            scenario("Home page becomes ready")
                .tag("smoke")
                .given("the storefront home page is open", home_is_open)
                .then("the product grid lists products", |w| {
                    let titles = w.home()?.product_titles()?;
                    ensure(!titles.is_empty(), "product grid is empty")
                })
                .and("the title mentions the store", |w| {
                    w.waiter()?.until_title_contains("STORE").map(|_| ())
                }),
        )
        .scenario(
            scenario("Filter products by category")
                .given("the storefront home page is open", home_is_open)
                .when("I choose the Monitors category", |w| {
                    let titles = w.home()?.select_category("Monitors")?;
                    w.titles = titles;
                    Ok(())
                })
                .then("only monitors are listed", |w| {
                    ensure(
                        w.titles.iter().any(|t| t.contains("monitor") || t.contains("ASUS")),
                        format!("unexpected titles {:?}", w.titles),
                    )?;
                    ensure(
                        !w.titles.iter().any(|t| t.contains("galaxy")),
                        "a phone is listed under Monitors",
                    )
                }),
        )
        .scenario(
            scenario("Product detail page")
                .given("the storefront home page is open", home_is_open)
                .when("I open Samsung galaxy s6", |w| {
                    w.home()?.open_product("Samsung galaxy s6").map(|_| ())
                })
                .then("its name and a price are shown", |w| {
                    let product = w.product()?;
                    ensure_eq(product.name()?.as_str(), "Samsung galaxy s6", "product name")?;
                    ensure(product.price()? > 0, "price is zero")
                }),
        )
        .scenario(
            scenario("Add a product to the cart")
                .tag("cart")
                .given("the storefront home page is open", home_is_open)
                .when("I add Nokia lumia 1520 to the cart", |w| {
                    w.add_to_cart("Nokia lumia 1520")
                })
                .then("the site confirms the product was added", |w| {
                    let alert = w.alert.as_deref().unwrap_or_default();
                    ensure(
                        alert.contains("Product added"),
                        format!("unexpected alert {alert:?}"),
                    )
                }),
        )
        .scenario(
            scenario("Cart total adds up")
                .tag("cart")
                .given("two products are in the cart", |w| {
                    w.add_to_cart("Samsung galaxy s6")?;
                    w.add_to_cart("Nexus 6")
                })
                .when("I open the cart", |w| w.home()?.open_cart().map(|_| ()))
                .then("the total is the sum of the line prices", |w| {
                    let cart = w.cart()?;
                    let items = cart.items(2)?;
                    let sum: u32 = items.iter().map(|i| i.price).sum();
                    ensure_eq(&cart.total()?, &sum, "cart total")
                }),
        )
        .scenario(
            scenario("Delete a product from the cart")
                .tag("cart")
                .given("one product is in the cart", |w| w.add_to_cart("Sony vaio i5"))
                .when("I delete it from the cart", |w| {
                    let cart = w.home()?.open_cart()?;
                    let _ = cart.items(1)?;
                    cart.delete("Sony vaio i5", 0)
                })
                .then("the row is gone", |w| {
                    let rows = w.browser()?.count(&cart_locators::row("Sony vaio i5"))?;
                    ensure_eq(&rows, &0, "rows for Sony vaio i5")
                }),
        )
        .scenario(
            scenario("Place an order")
                .tag("cart")
                .tag("smoke")
                .given("one product is in the cart", |w| w.add_to_cart("Iphone 6 32gb"))
                .when("I place the order", |w| {
                    let cart = w.home()?.open_cart()?;
                    let _ = cart.items(1)?;
                    let order = cart.place_order()?;
                    order.fill(&OrderDetails::default())?;
                    let confirmation = order.purchase()?;
                    order.confirm()?;
                    w.confirmation = Some(confirmation);
                    Ok(())
                })
                .then("a confirmation with the amount is shown", |w| {
                    let confirmation = w
                        .confirmation
                        .as_ref()
                        .ok_or_else(|| VigiaError::assertion("no confirmation recorded"))?;
                    ensure_eq(
                        confirmation.heading.as_str(),
                        "Thank you for your purchase!",
                        "heading",
                    )?;
                    ensure_eq(&confirmation.amount, &790, "amount")?;
                    ensure(!confirmation.id.is_empty(), "order id is empty")
                }),
        )
        .scenario(
            scenario("Log-in modal opens and closes")
                .tag("auth")
                .given("the storefront home page is open", home_is_open)
                .when("I open the log-in modal", |w| w.home()?.open_login().map(|_| ()))
                .then("I can close it again", |w| {
                    let home = w.home()?;
                    home.open_login()?.close()
                }),
        )
}

/// Whether the configured browser needs no network
#[must_use]
pub const fn runs_offline(config: &EnvironmentConfig) -> bool {
    matches!(config.browser, BrowserKind::Scripted)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::scenario::{ScenarioRunner, StepStatus};

    fn offline_config() -> EnvironmentConfig {
        let mut config = EnvironmentConfig {
            browser: BrowserKind::Scripted,
            ..EnvironmentConfig::default()
        };
        config.timeouts.poll_interval_ms = 5;
        config
    }

    #[test]
    fn test_feature_passes_offline() {
        let config = offline_config();
        assert!(runs_offline(&config));
        let result = ScenarioRunner::new(&config).run(&feature());
        for scenario in &result.scenarios {
            assert_eq!(
                scenario.status,
                StepStatus::Passed,
                "{}: {:?}",
                scenario.name,
                scenario.error
            );
        }
        assert_eq!(result.scenarios.len(), 8);
    }

    #[test]
    fn test_teardown_quits_the_session() {
        let config = offline_config();
        let mut world = StorefrontWorld::setup(&config).unwrap();
        world.teardown().unwrap();
        assert!(world.session().is_none());
        assert!(world.home().is_err());
    }

    #[cfg(not(feature = "browser"))]
    #[test]
    fn test_chromium_without_feature_fails_setup() {
        let config = EnvironmentConfig::default();
        let err = StorefrontWorld::setup(&config).unwrap_err();
        assert!(matches!(err, VigiaError::Configuration { .. }));
    }
}
