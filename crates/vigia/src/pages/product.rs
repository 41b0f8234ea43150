//! Product detail page.

use super::{parse_price, PageObject};
use crate::result::VigiaResult;
use crate::wait::Waiter;

pub mod locators {
    //! Product page selectors
    use crate::locator::{css, Locator};

    /// Product name heading
    pub fn name() -> Locator {
        css(".name").named("product name")
    }

    /// Price line ("$360 *includes tax")
    pub fn price() -> Locator {
        css(".price-container").named("product price")
    }

    /// Add-to-cart button
    pub fn add_to_cart() -> Locator {
        css("a.btn-success")
            .with_text("Add to cart")
            .named("add to cart button")
    }
}

/// Product detail page, reached from the home grid
#[derive(Debug, Clone)]
pub struct ProductPage<'s> {
    waiter: Waiter<'s>,
}

impl<'s> ProductPage<'s> {
    /// Wrap the current page
    #[must_use]
    pub const fn new(waiter: Waiter<'s>) -> Self {
        Self { waiter }
    }

    /// Product name
    pub fn name(&self) -> VigiaResult<String> {
        Ok(self.waiter.until_visible(&locators::name())?.text)
    }

    /// Price in dollars
    pub fn price(&self) -> VigiaResult<u32> {
        parse_price(&self.waiter.until_visible(&locators::price())?.text)
    }

    /// Add to cart and return the confirmation alert text
    pub fn add_to_cart(&self) -> VigiaResult<String> {
        let button = locators::add_to_cart();
        self.waiter.until_clickable(&button)?;
        self.waiter.session().click(&button)?;
        self.waiter.until_alert()
    }
}

impl PageObject for ProductPage<'_> {
    fn page_name(&self) -> &str {
        "product"
    }

    fn url_pattern(&self) -> &str {
        "prod.html"
    }

    fn wait_until_ready(&self) -> VigiaResult<()> {
        self.waiter.all(&[
            &|w: &Waiter<'_>| w.until_url_contains("prod.html").map(|_| ()),
            &|w: &Waiter<'_>| w.until_page_ready().map(|_| ()),
            &|w: &Waiter<'_>| w.until_visible(&locators::name()).map(|_| ()),
            &|w: &Waiter<'_>| w.until_clickable(&locators::add_to_cart()).map(|_| ()),
        ])
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::offline;
    use crate::pages::HomePage;
    use crate::wait::WaitConfig;
    use std::time::Duration;

    #[test]
    fn test_product_detail_and_add() {
        let session = offline::storefront();
        let waiter = Waiter::new(
            &session,
            WaitConfig::new(Duration::from_secs(2), Duration::from_millis(5)).unwrap(),
        );
        let home = HomePage::new(waiter, offline::BASE_URL);
        home.open().unwrap();
        let product = home.open_product("Nokia lumia 1520").unwrap();
        assert_eq!(product.name().unwrap(), "Nokia lumia 1520");
        assert_eq!(product.price().unwrap(), 820);
        assert!(product.add_to_cart().unwrap().contains("Product added"));
    }
}
