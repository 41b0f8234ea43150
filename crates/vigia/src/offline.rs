//! Offline model of the Demoblaze storefront.
//!
//! [`storefront`] returns a [`ScriptedSession`] that behaves like the live
//! site closely enough for the page objects: pages load in stages (ready
//! state first, content a few polls later), the cart total renders after the
//! rows, alerts arrive asynchronously and modals fade in. It keys elements by
//! the same locator functions the page objects use, so a selector change in
//! `pages` cannot silently diverge from the model.
//!
//! Used by the storefront suite when `browser: scripted` and by the page
//! object tests.

use crate::locator::{Locator, Selector};
use crate::pages::locators::{cart, home, modals, product};
use crate::session::{ReadyState, ScriptedElement, ScriptedSession, ScriptedState};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Root URL the offline storefront answers for
pub const BASE_URL: &str = "https://www.demoblaze.com/";

/// Account that exists from the start
pub const USERNAME: &str = "vigia_user";

/// Password of [`USERNAME`]
pub const PASSWORD: &str = "secret123";

const TITLE: &str = "STORE";

/// Polls before `document.readyState` reaches `complete`
const READY_AFTER: usize = 2;

/// Polls before page content is rendered
const CONTENT_AFTER: usize = 3;

/// Polls before the cart total is filled in
const TOTAL_AFTER: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Phones,
    Laptops,
    Monitors,
}

impl Category {
    const ALL: [Self; 3] = [Self::Phones, Self::Laptops, Self::Monitors];

    const fn label(self) -> &'static str {
        match self {
            Self::Phones => "Phones",
            Self::Laptops => "Laptops",
            Self::Monitors => "Monitors",
        }
    }
}

#[derive(Debug)]
struct Product {
    id: u32,
    title: &'static str,
    price: u32,
    category: Category,
}

const fn item(id: u32, title: &'static str, price: u32, category: Category) -> Product {
    Product {
        id,
        title,
        price,
        category,
    }
}

const CATALOG: &[Product] = &[
    item(1, "Samsung galaxy s6", 360, Category::Phones),
    item(2, "Nokia lumia 1520", 820, Category::Phones),
    item(3, "Nexus 6", 650, Category::Phones),
    item(4, "Samsung galaxy s7", 800, Category::Phones),
    item(5, "Iphone 6 32gb", 790, Category::Phones),
    item(6, "Sony xperia z5", 320, Category::Phones),
    item(7, "HTC One M9", 700, Category::Phones),
    item(8, "Sony vaio i5", 790, Category::Laptops),
    item(9, "Sony vaio i7", 790, Category::Laptops),
    item(10, "Apple monitor 24", 400, Category::Monitors),
    item(11, "MacBook air", 700, Category::Laptops),
    item(12, "Dell i7 8gb", 700, Category::Laptops),
    item(13, "2017 Dell 15.6 Inch", 700, Category::Laptops),
    item(14, "ASUS Full HD", 230, Category::Monitors),
    item(15, "MacBook Pro", 1100, Category::Laptops),
];

/// Products on the unfiltered home grid
const HOME_PAGE_SIZE: usize = 9;

fn find_product(id: u32) -> Option<&'static Product> {
    CATALOG.iter().find(|p| p.id == id)
}

/// Server-side state shared by every page of one session
#[derive(Debug)]
struct Shop {
    generation: u64,
    current_product: Option<u32>,
    cart: Vec<u32>,
    users: HashMap<String, String>,
    logged_in: Option<String>,
    orders: u32,
}

impl Default for Shop {
    fn default() -> Self {
        Self {
            generation: 0,
            current_product: None,
            cart: Vec::new(),
            users: HashMap::from([(USERNAME.to_string(), PASSWORD.to_string())]),
            logged_in: None,
            orders: 0,
        }
    }
}

type Shared = Arc<Mutex<Shop>>;

fn lock(shop: &Shared) -> MutexGuard<'_, Shop> {
    shop.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Storage key for a locator in the scripted model
fn key(locator: &Locator) -> String {
    match locator.selector() {
        Selector::CssWithText { css, .. } => css.clone(),
        other => other.to_string(),
    }
}

fn value(state: &ScriptedState, locator: &Locator) -> String {
    state
        .elements(&key(locator))
        .first()
        .map(|el| el.value.clone())
        .unwrap_or_default()
}

/// Build a fresh offline storefront session on `about:blank`
#[must_use]
pub fn storefront() -> ScriptedSession {
    let session = ScriptedSession::new();
    let shop: Shared = Arc::new(Mutex::new(Shop::default()));
    {
        let shop = Arc::clone(&shop);
        session.on_navigate(move |state, url| route(state, &shop, url));
    }
    session.with_state(|state| register_handlers(state, &shop));
    session
}

fn route(state: &mut ScriptedState, shop: &Shared, url: &str) {
    if url.contains("cart.html") {
        render_cart(state, shop, url);
    } else if url.contains("prod.html") {
        let id = url
            .split_once("idp_=")
            .and_then(|(_, rest)| rest.split('&').next())
            .and_then(|id| id.parse().ok());
        render_product(state, shop, url, id);
    } else {
        render_home(state, shop, url);
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Run `f` after `queries` polls unless the page was re-rendered meanwhile
fn later(
    state: &mut ScriptedState,
    shop: &Shared,
    queries: usize,
    f: impl FnOnce(&mut ScriptedState, &Shared) + Send + 'static,
) {
    let generation = lock(shop).generation;
    let shop = Arc::clone(shop);
    state.after_queries(queries, move |state| {
        let current = lock(&shop).generation;
        if current == generation {
            f(state, &shop);
        }
    });
}

fn begin_render(state: &mut ScriptedState, shop: &Shared, url: &str) {
    lock(shop).generation += 1;
    state.clear_elements();
    state.url = url.to_string();
    state.title = TITLE.to_string();
    state.ready_state = ReadyState::Loading;
    render_navbar(state, shop);
    render_modals(state);
    later(state, shop, READY_AFTER, |state, _| {
        state.ready_state = ReadyState::Complete;
    });
}

fn render_navbar(state: &mut ScriptedState, shop: &Shared) {
    let user = lock(shop).logged_in.clone();
    state.set_element(key(&home::brand()), ScriptedElement::visible("PRODUCT STORE"));
    state.set_element(key(&home::cart_link()), ScriptedElement::visible("Cart"));
    match user {
        Some(user) => {
            state.set_element(
                key(&home::user_name()),
                ScriptedElement::visible(format!("Welcome {user}")),
            );
            state.set_element(key(&home::logout_link()), ScriptedElement::visible("Log out"));
            state.set_element(key(&home::login_link()), ScriptedElement::hidden("Log in"));
            state.set_element(key(&home::signup_link()), ScriptedElement::hidden("Sign up"));
        }
        None => {
            state.set_element(key(&home::user_name()), ScriptedElement::hidden(""));
            state.set_element(key(&home::logout_link()), ScriptedElement::hidden("Log out"));
            state.set_element(key(&home::login_link()), ScriptedElement::visible("Log in"));
            state.set_element(key(&home::signup_link()), ScriptedElement::visible("Sign up"));
        }
    }
}

fn login_elements() -> Vec<(Locator, &'static str)> {
    vec![
        (modals::login_modal(), "Log in"),
        (modals::login_username(), ""),
        (modals::login_password(), ""),
        (modals::login_submit(), "Log in"),
        (modals::login_close(), "Close"),
    ]
}

fn signup_elements() -> Vec<(Locator, &'static str)> {
    vec![
        (modals::signup_modal(), "Sign up"),
        (modals::signup_username(), ""),
        (modals::signup_password(), ""),
        (modals::signup_submit(), "Sign up"),
    ]
}

fn order_elements() -> Vec<(Locator, &'static str)> {
    let mut elements = vec![(modals::order_modal(), "Place order")];
    for field in ["name", "country", "city", "card", "month", "year"] {
        elements.push((modals::order_field(field), ""));
    }
    elements.push((modals::purchase(), "Purchase"));
    elements
}

fn render_modals(state: &mut ScriptedState) {
    for (locator, text) in login_elements()
        .into_iter()
        .chain(signup_elements())
        .chain(order_elements())
    {
        state.set_element(key(&locator), ScriptedElement::hidden(text));
    }
}

fn set_modal_visible(state: &mut ScriptedState, elements: &[(Locator, &str)], visible: bool) {
    for (locator, _) in elements {
        state.set_visible(&key(locator), visible);
    }
}

fn fill_grid(state: &mut ScriptedState, products: &[&Product]) {
    state.set_elements(
        key(&home::product_cards()),
        products
            .iter()
            .map(|p| ScriptedElement::visible(format!("{} ${}", p.title, p.price)))
            .collect(),
    );
    state.set_elements(
        key(&home::product_titles()),
        products
            .iter()
            .map(|p| ScriptedElement::visible(p.title))
            .collect(),
    );
}

fn clear_grid(state: &mut ScriptedState) {
    state.remove(&key(&home::product_cards()));
    state.remove(&key(&home::product_titles()));
}

fn render_home(state: &mut ScriptedState, shop: &Shared, url: &str) {
    begin_render(state, shop, url);
    state.set_elements(
        key(&home::category("")),
        Category::ALL
            .iter()
            .map(|c| ScriptedElement::visible(c.label()))
            .collect(),
    );
    later(state, shop, CONTENT_AFTER, |state, _| {
        let products: Vec<&Product> = CATALOG.iter().take(HOME_PAGE_SIZE).collect();
        fill_grid(state, &products);
    });
}

fn render_product(state: &mut ScriptedState, shop: &Shared, url: &str, id: Option<u32>) {
    begin_render(state, shop, url);
    let Some(shown) = id.and_then(find_product) else {
        lock(shop).current_product = None;
        return;
    };
    lock(shop).current_product = Some(shown.id);
    later(state, shop, CONTENT_AFTER, move |state, _| {
        state.set_element(key(&product::name()), ScriptedElement::visible(shown.title));
        state.set_element(
            key(&product::price()),
            ScriptedElement::visible(format!("${} *includes tax", shown.price)),
        );
        state.set_element(
            key(&product::add_to_cart()),
            ScriptedElement::visible("Add to cart"),
        );
    });
}

fn render_cart(state: &mut ScriptedState, shop: &Shared, url: &str) {
    begin_render(state, shop, url);
    state.set_element(
        key(&cart::place_order()),
        ScriptedElement::visible("Place Order"),
    );
    state.set_element(key(&cart::total()), ScriptedElement::visible(""));

    let items: Vec<&Product> = lock(shop)
        .cart
        .iter()
        .filter_map(|id| find_product(*id))
        .collect();
    let total: u32 = items.iter().map(|p| p.price).sum();

    for p in &items {
        let shop_for_delete = Arc::clone(shop);
        let product_id = p.id;
        state.on_click(key(&cart::delete_link(p.title)), move |state, _| {
            {
                let mut shop = lock(&shop_for_delete);
                if let Some(pos) = shop.cart.iter().position(|id| *id == product_id) {
                    let _ = shop.cart.remove(pos);
                }
            }
            let url = state.url.clone();
            render_cart(state, &shop_for_delete, &url);
        });
    }

    later(state, shop, CONTENT_AFTER, move |state, _| {
        state.set_elements(
            key(&cart::rows()),
            items
                .iter()
                .map(|p| ScriptedElement::visible(format!("{} {} Delete", p.title, p.price)))
                .collect(),
        );
        state.set_elements(
            key(&cart::titles()),
            items.iter().map(|p| ScriptedElement::visible(p.title)).collect(),
        );
        state.set_elements(
            key(&cart::prices()),
            items
                .iter()
                .map(|p| ScriptedElement::visible(p.price.to_string()))
                .collect(),
        );
        for p in &items {
            let link = key(&cart::delete_link(p.title));
            let count = state.elements(&link).len();
            state.set_elements(link, vec![ScriptedElement::visible("Delete"); count + 1]);
        }
    });
    if total > 0 {
        later(state, shop, TOTAL_AFTER, move |state, _| {
            state.set_element(key(&cart::total()), ScriptedElement::visible(total.to_string()));
        });
    }
}

// ============================================================================
// User actions
// ============================================================================

fn on_click(
    state: &mut ScriptedState,
    shop: &Shared,
    locator: &Locator,
    handler: impl Fn(&mut ScriptedState, &Shared, &ScriptedElement) + Send + Sync + 'static,
) {
    let shop = Arc::clone(shop);
    state.on_click(key(locator), move |state, el| handler(state, &shop, el));
}

fn register_handlers(state: &mut ScriptedState, shop: &Shared) {
    on_click(state, shop, &home::brand(), |state, shop, _| {
        render_home(state, shop, BASE_URL);
    });
    on_click(state, shop, &home::cart_link(), |state, shop, _| {
        render_cart(state, shop, &format!("{BASE_URL}cart.html"));
    });
    on_click(state, shop, &home::category(""), |state, shop, el| {
        let label = el.text.clone();
        clear_grid(state);
        later(state, shop, READY_AFTER, move |state, _| {
            let products: Vec<&Product> = CATALOG
                .iter()
                .filter(|p| p.category.label() == label)
                .collect();
            fill_grid(state, &products);
        });
    });
    on_click(state, shop, &home::product_titles(), |state, shop, el| {
        if let Some(hit) = CATALOG.iter().find(|p| p.title == el.text) {
            let url = format!("{BASE_URL}prod.html?idp_={}", hit.id);
            render_product(state, shop, &url, Some(hit.id));
        }
    });
    on_click(state, shop, &product::add_to_cart(), |state, shop, _| {
        let added = {
            let mut shop = lock(shop);
            match shop.current_product {
                Some(id) => {
                    shop.cart.push(id);
                    true
                }
                None => false,
            }
        };
        if added {
            state.after_queries(READY_AFTER, |state| state.push_alert("Product added."));
        }
    });

    register_account_handlers(state, shop);
    register_order_handlers(state, shop);
}

fn register_account_handlers(state: &mut ScriptedState, shop: &Shared) {
    on_click(state, shop, &home::login_link(), |state, shop, _| {
        later(state, shop, 1, |state, _| {
            set_modal_visible(state, &login_elements(), true);
        });
    });
    on_click(state, shop, &modals::login_close(), |state, shop, _| {
        later(state, shop, 1, |state, _| {
            set_modal_visible(state, &login_elements(), false);
        });
    });
    on_click(state, shop, &modals::login_submit(), |state, shop, _| {
        let username = value(state, &modals::login_username());
        let password = value(state, &modals::login_password());
        let rejection = {
            let mut shop = lock(shop);
            let known = shop.users.get(&username).cloned();
            match known {
                None => Some("User does not exist."),
                Some(expected) if expected != password => Some("Wrong password."),
                Some(_) => {
                    shop.logged_in = Some(username.clone());
                    None
                }
            }
        };
        match rejection {
            Some(message) => state.after_queries(1, move |state| state.push_alert(message)),
            None => {
                set_modal_visible(state, &login_elements(), false);
                later(state, shop, READY_AFTER, move |state, shop| render_navbar(state, shop));
            }
        }
    });
    on_click(state, shop, &home::logout_link(), |state, shop, _| {
        lock(shop).logged_in = None;
        render_home(state, shop, &format!("{BASE_URL}index.html"));
    });

    on_click(state, shop, &home::signup_link(), |state, shop, _| {
        later(state, shop, 1, |state, _| {
            set_modal_visible(state, &signup_elements(), true);
        });
    });
    on_click(state, shop, &modals::signup_submit(), |state, shop, _| {
        let username = value(state, &modals::signup_username());
        let password = value(state, &modals::signup_password());
        let created = {
            let mut shop = lock(shop);
            if shop.users.contains_key(&username) {
                false
            } else {
                let _ = shop.users.insert(username, password);
                true
            }
        };
        if created {
            set_modal_visible(state, &signup_elements(), false);
            state.after_queries(1, |state| state.push_alert("Sign up successful."));
        } else {
            state.after_queries(1, |state| state.push_alert("This user already exist."));
        }
    });
}

fn register_order_handlers(state: &mut ScriptedState, shop: &Shared) {
    on_click(state, shop, &cart::place_order(), |state, shop, _| {
        later(state, shop, 1, |state, _| {
            set_modal_visible(state, &order_elements(), true);
        });
    });
    on_click(state, shop, &modals::purchase(), |state, shop, _| {
        let name = value(state, &modals::order_field("name"));
        let card = value(state, &modals::order_field("card"));
        if name.is_empty() || card.is_empty() {
            state.after_queries(1, |state| {
                state.push_alert("Please fill out Name and Creditcard.");
            });
            return;
        }
        let (order_id, amount) = {
            let mut shop = lock(shop);
            shop.orders += 1;
            let amount: u32 = shop
                .cart
                .iter()
                .filter_map(|id| find_product(*id))
                .map(|p| p.price)
                .sum();
            (7_340_000 + shop.orders, amount)
        };
        let date = chrono::Utc::now().format("%-d/%-m/%Y").to_string();
        let details = format!(
            "Id: {order_id}\nAmount: {amount} USD\nCard Number: {card}\nName: {name}\nDate: {date}"
        );
        set_modal_visible(state, &order_elements(), false);
        later(state, shop, 1, move |state, _| {
            let heading = "Thank you for your purchase!";
            state.set_element(key(&modals::confirmation()), ScriptedElement::visible(heading));
            state.set_element(
                key(&modals::confirmation_heading()),
                ScriptedElement::visible(heading),
            );
            state.set_element(
                key(&modals::confirmation_details()),
                ScriptedElement::visible(details),
            );
            state.set_element(key(&modals::confirmation_ok()), ScriptedElement::visible("OK"));
        });
    });
    on_click(state, shop, &modals::confirmation_ok(), |state, shop, _| {
        lock(shop).cart.clear();
        render_home(state, shop, &format!("{BASE_URL}index.html"));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::session::BrowserSession;

    fn poll(session: &ScriptedSession, times: usize) {
        for _ in 0..times {
            let _ = session.current_state().unwrap();
        }
    }

    #[test]
    fn test_home_renders_in_stages() {
        let session = storefront();
        session.navigate(BASE_URL).unwrap();
        assert_eq!(session.count(&home::product_titles()).unwrap(), 0);
        poll(&session, 3);
        let page = session.current_state().unwrap();
        assert_eq!(page.title, "STORE");
        assert!(page.is_complete());
        assert_eq!(session.count(&home::product_titles()).unwrap(), 9);
    }

    #[test]
    fn test_navigation_cancels_pending_render() {
        let session = storefront();
        session.navigate(BASE_URL).unwrap();
        session
            .navigate(&format!("{BASE_URL}prod.html?idp_=3"))
            .unwrap();
        poll(&session, 5);
        assert_eq!(session.count(&home::product_titles()).unwrap(), 0);
        assert_eq!(session.text(&product::name()).unwrap(), "Nexus 6");
    }

    #[test]
    fn test_product_url_with_unknown_id_has_no_content() {
        let session = storefront();
        session
            .navigate(&format!("{BASE_URL}prod.html?idp_=999"))
            .unwrap();
        poll(&session, 5);
        assert!(session.element_state(&product::name()).is_err());
    }

    #[test]
    fn test_empty_cart_has_no_total() {
        let session = storefront();
        session.navigate(&format!("{BASE_URL}cart.html")).unwrap();
        poll(&session, 6);
        assert_eq!(session.text(&cart::total()).unwrap(), "");
        assert_eq!(session.count(&cart::rows()).unwrap(), 0);
    }

    #[test]
    fn test_purchase_requires_name_and_card() {
        let session = storefront();
        session.navigate(&format!("{BASE_URL}cart.html")).unwrap();
        session.click(&cart::place_order()).unwrap();
        poll(&session, 2);
        session.click(&modals::purchase()).unwrap();
        assert_eq!(
            session.take_alert().unwrap().as_deref(),
            Some("Please fill out Name and Creditcard.")
        );
    }

    #[test]
    fn test_modals_start_hidden() {
        let session = storefront();
        session.navigate(BASE_URL).unwrap();
        for locator in [
            modals::login_modal(),
            modals::signup_modal(),
            modals::order_modal(),
        ] {
            assert!(!session.element_state(&locator).unwrap().visible);
        }
    }

    #[test]
    fn test_key_strips_text_filter() {
        assert_eq!(key(&home::product_link("Nexus 6")), "#tbodyid .card-title a");
        assert_eq!(key(&home::cart_link()), "#cartur");
    }
}
