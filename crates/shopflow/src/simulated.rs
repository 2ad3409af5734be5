//! In-memory storefront.
//!
//! `SimulatedStore` models the pages the checkout flow walks through (login,
//! catalog, cart, checkout, payment, confirmation) as flat lists of rendered
//! elements, and answers [`Selector`]s against them the way the real DOM
//! would. It backs the crate's own tests and the CLI's `--simulate` dry run.
//!
//! Optional delays make catalog content, the "Added!" overlay and the invoice
//! file appear late, so bounded waits are exercised for real.

use crate::result::{FlowError, FlowResult};
use crate::selector::{ElementState, Selector};
use crate::session::BrowserSession;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

const EMAIL_INPUT: &str = r#"input[data-qa="login-email"]"#;
const PASSWORD_INPUT: &str = r#"input[data-qa="login-password"]"#;
const PAYMENT_INPUTS: [&str; 5] = [
    r#"input[data-qa="name-on-card"]"#,
    r#"input[data-qa="card-number"]"#,
    r#"input[data-qa="cvc"]"#,
    r#"input[data-qa="expiry-month"]"#,
    r#"input[data-qa="expiry-year"]"#,
];
const PRODUCT_CARD: &str = ".single-products";

/// A registered storefront customer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Login email
    pub email: String,
    /// Login password
    pub password: String,
    /// First name shown in the header and on invoices
    pub first_name: String,
    /// Last name shown in the header and on invoices
    pub last_name: String,
}

impl Account {
    /// Create an account with the storefront's placeholder name
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            first_name: "First Name".to_string(),
            last_name: "Last Name".to_string(),
        }
    }

    /// Set the customer's name
    #[must_use]
    pub fn with_name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = first.into();
        self.last_name = last.into();
        self
    }

    /// "First Last"
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A catalog entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    /// Display name
    pub name: String,
    /// Price in rupees
    pub price: u64,
}

impl CatalogItem {
    /// Create a catalog entry
    #[must_use]
    pub fn new(name: impl Into<String>, price: u64) -> Self {
        Self {
            name: name.into(),
            price,
        }
    }
}

fn default_catalog() -> Vec<CatalogItem> {
    [
        ("Blue Top", 500),
        ("Men Tshirt", 400),
        ("Sleeveless Dress", 1000),
        ("Stylish Dress", 1500),
        ("Winter Top", 600),
        ("Summer White Top", 400),
        ("Madame Top For Women", 1000),
        ("Fancy Green Top", 700),
    ]
    .into_iter()
    .map(|(name, price)| CatalogItem::new(name, price))
    .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    None,
    SubmitLogin,
    AddToCart(usize),
    DismissModal,
    ProceedToCheckout,
    PlaceOrder,
    Pay,
    DownloadInvoice,
    Continue,
}

/// One rendered element
#[derive(Debug, Clone)]
struct Node {
    css: Vec<&'static str>,
    text: String,
    visible: bool,
    scope: Option<(&'static str, usize)>,
    action: Action,
}

impl Node {
    fn new(css: &[&'static str], text: impl Into<String>) -> Self {
        Self {
            css: css.to_vec(),
            text: text.into(),
            visible: true,
            scope: None,
            action: Action::None,
        }
    }

    fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    fn on_click(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    fn in_scope(mut self, container: &'static str, index: usize) -> Self {
        self.scope = Some((container, index));
        self
    }

    fn has_css(&self, css: &str) -> bool {
        self.css.iter().any(|c| *c == css)
    }
}

fn matches(node: &Node, selector: &Selector) -> bool {
    match selector {
        Selector::Css(css) => node.has_css(css),
        Selector::Text(text) => node.text.contains(text.as_str()),
        Selector::CssWithText { css, text } => node.has_css(css) && node.text.contains(text.as_str()),
        Selector::Scoped { .. } => false,
    }
}

fn select<'n>(nodes: &'n [Node], selector: &Selector) -> Vec<&'n Node> {
    match selector {
        Selector::Scoped {
            container,
            anchor,
            target,
        } => {
            let scope = nodes
                .iter()
                .filter(|n| n.scope.is_some_and(|(c, _)| c == container))
                .find(|n| matches(n, anchor))
                .and_then(|n| n.scope);
            match scope {
                Some(scope) => nodes
                    .iter()
                    .filter(|n| n.scope == Some(scope) && n.has_css(target))
                    .collect(),
                None => Vec::new(),
            }
        }
        other => nodes.iter().filter(|n| matches(n, other)).collect(),
    }
}

#[derive(Debug)]
struct StoreState {
    path: String,
    page_since: Instant,
    account: Option<usize>,
    login_failed: bool,
    cart: Vec<usize>,
    modal_since: Option<Instant>,
    form: HashMap<&'static str, String>,
    download_dir: Option<PathBuf>,
    last_total: Option<u64>,
}

/// In-memory storefront implementing [`BrowserSession`]
#[derive(Debug)]
pub struct SimulatedStore {
    base_url: String,
    accounts: Vec<Account>,
    catalog: Vec<CatalogItem>,
    render_delay: Duration,
    download_delay: Duration,
    cart_overlay: bool,
    invoice_name: String,
    state: Mutex<StoreState>,
}

impl SimulatedStore {
    /// Create a store with the default catalog and no accounts
    #[must_use]
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self {
            base_url: base_url.as_ref().trim_end_matches('/').to_string(),
            accounts: Vec::new(),
            catalog: default_catalog(),
            render_delay: Duration::ZERO,
            download_delay: Duration::ZERO,
            cart_overlay: true,
            invoice_name: crate::invoice::DEFAULT_INVOICE_FILE.to_string(),
            state: Mutex::new(StoreState {
                path: "about:blank".to_string(),
                page_since: Instant::now(),
                account: None,
                login_failed: false,
                cart: Vec::new(),
                modal_since: None,
                form: HashMap::new(),
                download_dir: None,
                last_total: None,
            }),
        }
    }

    /// Register a customer
    #[must_use]
    pub fn with_account(mut self, account: Account) -> Self {
        self.accounts.push(account);
        self
    }

    /// Replace the catalog
    #[must_use]
    pub fn with_catalog(mut self, catalog: Vec<CatalogItem>) -> Self {
        self.catalog = catalog;
        self
    }

    /// Delay before catalog content and the cart overlay render
    #[must_use]
    pub const fn with_render_delay(mut self, delay: Duration) -> Self {
        self.render_delay = delay;
        self
    }

    /// Add to cart without ever showing the confirmation overlay
    #[must_use]
    pub const fn without_cart_overlay(mut self) -> Self {
        self.cart_overlay = false;
        self
    }

    /// Delay before a downloaded invoice lands on disk
    #[must_use]
    pub const fn with_download_delay(mut self, delay: Duration) -> Self {
        self.download_delay = delay;
        self
    }

    /// Number of items in the cart
    pub fn cart_len(&self) -> FlowResult<usize> {
        Ok(self.state()?.cart.len())
    }

    /// Names of the items in the cart, in insertion order
    pub fn cart_items(&self) -> FlowResult<Vec<String>> {
        let state = self.state()?;
        Ok(state
            .cart
            .iter()
            .map(|&i| self.catalog[i].name.clone())
            .collect())
    }

    /// Whether a customer is logged in
    pub fn is_logged_in(&self) -> FlowResult<bool> {
        Ok(self.state()?.account.is_some())
    }

    /// Whether the "Added!" overlay is open
    pub fn modal_open(&self) -> FlowResult<bool> {
        Ok(self.state()?.modal_since.is_some())
    }

    /// Current application path
    pub fn current_path(&self) -> FlowResult<String> {
        Ok(self.state()?.path.clone())
    }

    /// Total of the last paid order
    pub fn last_order_total(&self) -> FlowResult<Option<u64>> {
        Ok(self.state()?.last_total)
    }

    fn state(&self) -> FlowResult<MutexGuard<'_, StoreState>> {
        self.state
            .lock()
            .map_err(|_| FlowError::page("simulated store state poisoned"))
    }

    fn navigate(state: &mut StoreState, path: &str) {
        state.path = if path.is_empty() {
            "/".to_string()
        } else {
            path.to_string()
        };
        state.page_since = Instant::now();
        state.modal_since = None;
        state.login_failed = false;
        state.form.clear();
    }

    fn render(&self, state: &StoreState) -> Vec<Node> {
        let ready = state.page_since.elapsed() >= self.render_delay;
        let mut nodes = Vec::new();

        match state.account.and_then(|i| self.accounts.get(i)) {
            Some(account) => {
                nodes.push(Node::new(&["a"], format!("Logged in as {}", account.display_name())));
            }
            None => nodes.push(Node::new(&["a"], "Signup / Login")),
        }

        let path = state.path.as_str();
        match path {
            "/" => nodes.push(Node::new(&["h2"], "Features Items")),
            "/login" => {
                nodes.push(Node::new(&["h2"], "Login to your account"));
                nodes.push(Node::new(&[EMAIL_INPUT], ""));
                nodes.push(Node::new(&[PASSWORD_INPUT], ""));
                nodes.push(
                    Node::new(&[r#"button[data-qa="login-button"]"#], "Login")
                        .on_click(Action::SubmitLogin),
                );
                if state.login_failed {
                    nodes.push(Node::new(&["p"], "Your email or password is incorrect!"));
                }
            }
            "/products" if ready => {
                nodes.push(Node::new(&["h2"], "All Products"));
                for (i, item) in self.catalog.iter().enumerate() {
                    nodes.push(
                        Node::new(&[".single-products .productinfo p"], item.name.clone())
                            .in_scope(PRODUCT_CARD, i),
                    );
                    nodes.push(
                        Node::new(&["a.add-to-cart"], "Add to cart")
                            .in_scope(PRODUCT_CARD, i)
                            .on_click(Action::AddToCart(i)),
                    );
                    // hover overlay duplicate
                    nodes.push(
                        Node::new(&["a.add-to-cart"], "Add to cart")
                            .in_scope(PRODUCT_CARD, i)
                            .on_click(Action::AddToCart(i))
                            .hidden(),
                    );
                }
                nodes.extend(self.render_modal(state));
            }
            "/view_cart" => {
                nodes.push(Node::new(&[".active"], "Shopping Cart"));
                for &i in &state.cart {
                    nodes.push(Node::new(&["td.cart_description a"], self.catalog[i].name.clone()));
                }
                nodes.push(
                    Node::new(&["a.btn"], "Proceed To Checkout").on_click(Action::ProceedToCheckout),
                );
            }
            "/checkout" => {
                nodes.push(Node::new(&["h2"], "Address Details"));
                nodes.push(Node::new(&["h2"], "Review Your Order"));
                for &i in &state.cart {
                    nodes.push(Node::new(
                        &[".cart_description > h4 > a"],
                        self.catalog[i].name.clone(),
                    ));
                }
                nodes.push(Node::new(&["a.btn"], "Place Order").on_click(Action::PlaceOrder));
            }
            "/payment" => {
                nodes.push(Node::new(&[".active"], "Payment"));
                for input in PAYMENT_INPUTS {
                    nodes.push(Node::new(&[input], ""));
                }
                nodes.push(
                    Node::new(&[r#"button[data-qa="pay-button"]"#], "Pay and Confirm Order")
                        .on_click(Action::Pay),
                );
            }
            p if p.starts_with("/payment_done") => {
                nodes.push(Node::new(&[r#"[data-qa="order-placed"] > b"#], "Order Placed!"));
                nodes.push(Node::new(
                    &["p"],
                    "Congratulations! Your order has been confirmed!",
                ));
                nodes.push(
                    Node::new(&["a.btn"], "Download Invoice").on_click(Action::DownloadInvoice),
                );
                nodes.push(
                    Node::new(&[r#"a[data-qa="continue-button"]"#, "a.btn"], "Continue")
                        .on_click(Action::Continue),
                );
            }
            _ => {}
        }
        nodes
    }

    fn render_modal(&self, state: &StoreState) -> Vec<Node> {
        let shown = self.cart_overlay
            && state
                .modal_since
                .is_some_and(|since| since.elapsed() >= self.render_delay);
        if !shown {
            return vec![Node::new(&[".modal-content"], "").hidden()];
        }
        vec![
            Node::new(
                &[".modal-content"],
                "Added! Your product has been added to cart. View Cart Continue Shopping",
            ),
            Node::new(&[".modal-content .modal-header h4"], "Added!"),
            Node::new(&[".modal-body"], "Your product has been added to cart. View Cart"),
            Node::new(&[".modal-footer button.btn"], "Continue Shopping")
                .on_click(Action::DismissModal),
        ]
    }

    fn perform(&self, state: &mut StoreState, action: Action) -> FlowResult<()> {
        match action {
            Action::None => {}
            Action::SubmitLogin => {
                let email = state.form.get(EMAIL_INPUT).cloned().unwrap_or_default();
                let password = state.form.get(PASSWORD_INPUT).cloned().unwrap_or_default();
                let found = self
                    .accounts
                    .iter()
                    .position(|a| a.email == email && a.password == password);
                match found {
                    Some(i) => {
                        state.account = Some(i);
                        Self::navigate(state, "/");
                    }
                    None => {
                        state.form.clear();
                        state.login_failed = true;
                    }
                }
            }
            Action::AddToCart(i) => {
                state.cart.push(i);
                state.modal_since = Some(Instant::now());
            }
            Action::DismissModal => state.modal_since = None,
            Action::ProceedToCheckout => {
                if state.account.is_some() {
                    Self::navigate(state, "/checkout");
                }
            }
            Action::PlaceOrder => Self::navigate(state, "/payment"),
            Action::Pay => {
                let complete = PAYMENT_INPUTS
                    .iter()
                    .all(|input| state.form.get(input).is_some_and(|v| !v.is_empty()));
                if complete {
                    let total = state.cart.iter().map(|&i| self.catalog[i].price).sum();
                    state.cart.clear();
                    state.last_total = Some(total);
                    Self::navigate(state, &format!("/payment_done/{total}"));
                }
            }
            Action::DownloadInvoice => self.download_invoice(state)?,
            Action::Continue => Self::navigate(state, "/"),
        }
        Ok(())
    }

    fn download_invoice(&self, state: &StoreState) -> FlowResult<()> {
        let Some(dir) = state.download_dir.clone() else {
            tracing::warn!("invoice download requested without a download directory");
            return Ok(());
        };
        let name = state
            .account
            .and_then(|i| self.accounts.get(i))
            .map(Account::display_name)
            .unwrap_or_default();
        let total = state.last_total.unwrap_or_default();
        let content = format!("Hi {name}, Your total purchase amount is {total}. Thank you");
        let path = dir.join(&self.invoice_name);

        if self.download_delay.is_zero() {
            return std::fs::write(&path, content)
                .map_err(|e| FlowError::environment(&path, format!("invoice write failed: {e}")));
        }
        let delay = self.download_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = tokio::fs::write(&path, content).await {
                tracing::warn!(path = %path.display(), error = %e, "delayed invoice write failed");
            }
        });
        Ok(())
    }
}

#[async_trait]
impl BrowserSession for SimulatedStore {
    async fn goto(&self, url: &str) -> FlowResult<()> {
        let path = url
            .strip_prefix(&self.base_url)
            .ok_or_else(|| FlowError::Navigation {
                url: url.to_string(),
                message: format!("outside simulated storefront {}", self.base_url),
            })?;
        let mut state = self.state()?;
        Self::navigate(&mut state, path);
        Ok(())
    }

    async fn current_url(&self) -> FlowResult<String> {
        let state = self.state()?;
        if state.path.starts_with('/') {
            Ok(format!("{}{}", self.base_url, state.path))
        } else {
            Ok(state.path.clone())
        }
    }

    async fn probe(&self, selector: &Selector) -> FlowResult<Option<ElementState>> {
        let state = self.state()?;
        let nodes = self.render(&state);
        let matched = select(&nodes, selector);
        Ok(matched.first().map(|first| ElementState {
            count: matched.len(),
            text: first.text.trim().to_string(),
            all_text: matched
                .iter()
                .map(|n| n.text.trim())
                .collect::<Vec<_>>()
                .join(" "),
            visible: first.visible,
        }))
    }

    async fn click(&self, selector: &Selector) -> FlowResult<()> {
        let mut state = self.state()?;
        let nodes = self.render(&state);
        let action = select(&nodes, selector)
            .first()
            .map(|n| n.action)
            .ok_or_else(|| FlowError::page(format!("nothing to click for {selector}")))?;
        self.perform(&mut state, action)
    }

    async fn type_text(&self, selector: &Selector, text: &str) -> FlowResult<()> {
        let mut state = self.state()?;
        let nodes = self.render(&state);
        let key = select(&nodes, selector)
            .first()
            .and_then(|n| n.css.first().copied())
            .ok_or_else(|| FlowError::page(format!("nothing to type into for {selector}")))?;
        state.form.entry(key).or_default().push_str(text);
        Ok(())
    }

    async fn set_download_dir(&self, dir: &Path) -> FlowResult<()> {
        self.state()?.download_dir = Some(dir.to_path_buf());
        Ok(())
    }
}
