//! Cart page.

use super::{parse_price, OrderModal, PageObject};
use crate::result::VigiaResult;
use crate::wait::Waiter;

pub mod locators {
    //! Cart selectors
    use crate::locator::{css, xpath, Locator};

    /// Cart rows
    pub fn rows() -> Locator {
        css("#tbodyid tr.success").named("cart rows")
    }

    /// Title cells
    pub fn titles() -> Locator {
        css("#tbodyid tr.success td:nth-child(2)").named("cart titles")
    }

    /// Price cells
    pub fn prices() -> Locator {
        css("#tbodyid tr.success td:nth-child(3)").named("cart prices")
    }

    /// Row for one product
    pub fn row(title: &str) -> Locator {
        css("#tbodyid tr.success")
            .with_text(title)
            .named(format!("cart row '{title}'"))
    }

    /// Delete link of the first row for a product
    pub fn delete_link(title: &str) -> Locator {
        xpath(format!("//tr[td[text()='{title}']]//a[text()='Delete']"))
            .named(format!("delete link for '{title}'"))
    }

    /// Cart total
    pub fn total() -> Locator {
        css("#totalp").named("cart total")
    }

    /// Opens the order modal
    pub fn place_order() -> Locator {
        css("button.btn-success")
            .with_text("Place Order")
            .named("place order button")
    }
}

/// One line of the cart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItem {
    /// Product title
    pub title: String,
    /// Price in dollars
    pub price: u32,
}

/// Cart page
#[derive(Debug, Clone)]
pub struct CartPage<'s> {
    waiter: Waiter<'s>,
}

impl<'s> CartPage<'s> {
    /// Wrap the current page
    #[must_use]
    pub const fn new(waiter: Waiter<'s>) -> Self {
        Self { waiter }
    }

    /// Wait for at least `count` rows and return every row
    pub fn items(&self, count: usize) -> VigiaResult<Vec<CartItem>> {
        self.waiter.until_count_at_least(&locators::rows(), count)?;
        let session = self.waiter.session();
        let titles = session.texts(&locators::titles())?;
        let prices = session.texts(&locators::prices())?;
        titles
            .into_iter()
            .zip(prices)
            .map(|(title, price)| {
                Ok(CartItem {
                    title,
                    price: parse_price(&price)?,
                })
            })
            .collect()
    }

    /// Total once it is rendered
    pub fn total(&self) -> VigiaResult<u32> {
        let mut total = 0;
        self.waiter.until_condition("cart total to render", |session| {
            let text = session.text(&locators::total())?;
            match parse_price(&text) {
                Ok(value) => {
                    total = value;
                    Ok(true)
                }
                Err(_) => Ok(false),
            }
        })?;
        Ok(total)
    }

    /// Delete one row for `title` and wait until the cart has `remaining`
    /// rows for it
    pub fn delete(&self, title: &str, remaining: usize) -> VigiaResult<()> {
        let link = locators::delete_link(title);
        self.waiter.until_clickable(&link)?;
        self.waiter.session().click(&link)?;
        self.waiter.until_condition(
            &format!("cart to hold {remaining} of '{title}'"),
            |session| Ok(session.count(&locators::row(title))? == remaining),
        )
    }

    /// Open the order modal
    pub fn place_order(&self) -> VigiaResult<OrderModal<'s>> {
        self.waiter.until_clickable(&locators::place_order())?;
        self.waiter.session().click(&locators::place_order())?;
        let modal = OrderModal::new(self.waiter);
        modal.wait_until_ready()?;
        Ok(modal)
    }
}

impl PageObject for CartPage<'_> {
    fn page_name(&self) -> &str {
        "cart"
    }

    fn url_pattern(&self) -> &str {
        "cart.html"
    }

    fn wait_until_ready(&self) -> VigiaResult<()> {
        self.waiter.all(&[
            &|w: &Waiter<'_>| w.until_url_contains("cart.html").map(|_| ()),
            &|w: &Waiter<'_>| w.until_page_ready().map(|_| ()),
            &|w: &Waiter<'_>| w.until_visible(&locators::place_order()).map(|_| ()),
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
    fn test_total_and_delete() {
        let session = offline::storefront();
        let waiter = Waiter::new(
            &session,
            WaitConfig::new(Duration::from_secs(2), Duration::from_millis(5)).unwrap(),
        );
        let home = HomePage::new(waiter, offline::BASE_URL);
        home.open().unwrap();
        home.open_product("Samsung galaxy s6").unwrap().add_to_cart().unwrap();
        home.open().unwrap();
        home.open_product("Nexus 6").unwrap().add_to_cart().unwrap();

        let cart = home.open_cart().unwrap();
        let items = cart.items(2).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(cart.total().unwrap(), 360 + 650);

        cart.delete("Nexus 6", 0).unwrap();
        assert_eq!(cart.items(1).unwrap(), vec![CartItem {
            title: "Samsung galaxy s6".into(),
            price: 360
        }]);
        assert_eq!(cart.total().unwrap(), 360);
    }

    #[test]
    fn test_delete_link_xpath() {
        assert_eq!(
            locators::delete_link("Nexus 6").selector().to_string(),
            "xpath=//tr[td[text()='Nexus 6']]//a[text()='Delete']"
        );
    }
}
