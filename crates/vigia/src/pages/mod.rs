//! Page objects for the Demoblaze storefront.
//!
//! Pages borrow a [`Waiter`] (and through it the session) for the length of
//! a step. Locators are built by small public functions in each page module
//! so the same selectors can drive the offline storefront model.
//!
//! Every action that changes the page ends with an explicit wait for the
//! state it expects; nothing here sleeps.

mod cart;
mod home;
mod modals;
mod product;

pub use cart::{CartItem, CartPage};
pub use home::HomePage;
pub use modals::{LoginModal, OrderConfirmation, OrderDetails, OrderModal, SignupModal};
pub use product::ProductPage;

/// Selector builders, grouped by page
pub mod locators {
    pub use super::cart::locators as cart;
    pub use super::home::locators as home;
    pub use super::modals::locators as modals;
    pub use super::product::locators as product;
}

use crate::result::{VigiaError, VigiaResult};
use crate::wait::Waiter;

/// A page or modal that can tell when it is ready for interaction.
pub trait PageObject {
    /// Name used in logs and failures
    fn page_name(&self) -> &str;

    /// Fragment of the URL this page lives at
    fn url_pattern(&self) -> &str;

    /// Block until the page can be interacted with
    ///
    /// # Errors
    ///
    /// A timeout naming the first readiness check that did not hold.
    fn wait_until_ready(&self) -> VigiaResult<()>;
}

/// Parse the first run of digits in `text` ("$360 *includes tax" -> 360)
pub fn parse_price(text: &str) -> VigiaResult<u32> {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect();
    digits
        .parse()
        .map_err(|_| VigiaError::assertion(format!("no price in {text:?}")))
}

/// Shared open-then-wait for pages reached by URL
fn open(waiter: &Waiter<'_>, url: &str, page: &dyn PageObject) -> VigiaResult<()> {
    tracing::debug!(page = page.page_name(), url, "opening page");
    waiter.session().navigate(url)?;
    page.wait_until_ready()
}
