//! Reusable storefront interactions.
//!
//! Each helper drives a multi-step UI interaction and only returns once its
//! post-condition is observable in the page.

use crate::context::{FlowContext, TextCheck};
use crate::fixture::Credentials;
use crate::result::FlowResult;
use crate::selector::Selector;
use crate::wait::not_found;

/// Banner shown in the header once a customer is logged in
pub const LOGGED_IN_TEXT: &str = "Logged in as";

/// Log in through the storefront login form.
///
/// Blocks until the "Logged in as" banner is visible. Rejected credentials
/// surface as a timeout on that banner.
pub async fn login(ctx: &FlowContext<'_>, credentials: &Credentials) -> FlowResult<()> {
    tracing::info!(email = %credentials.email, "logging in");
    ctx.visit("/login").await?;
    ctx.type_into(
        &Selector::css(r#"input[data-qa="login-email"]"#),
        &credentials.email,
    )
    .await?;
    ctx.type_into(
        &Selector::css(r#"input[data-qa="login-password"]"#),
        &credentials.password,
    )
    .await?;
    ctx.click_visible(
        &Selector::css(r#"button[data-qa="login-button"]"#),
        ctx.timeouts().default_command,
    )
    .await?;
    ctx.wait_visible(&Selector::text(LOGGED_IN_TEXT), ctx.timeouts().login)
        .await?;
    Ok(())
}

/// Add the catalog entry named `product` to the cart.
///
/// The name is matched as a case-sensitive substring of the entry's title.
/// Leaves the catalog page with the confirmation overlay dismissed.
pub async fn add_product_to_cart(ctx: &FlowContext<'_>, product: &str) -> FlowResult<()> {
    let timeouts = ctx.timeouts();
    tracing::info!(product, "adding product to cart");
    ctx.visit("/products").await?;
    ctx.wait_visible(
        &Selector::css_with_text("h2", "All Products"),
        timeouts.element,
    )
    .await?;

    let title = Selector::css_with_text(".single-products .productinfo p", product);
    ctx.wait_visible(&title, timeouts.element)
        .await
        .map_err(not_found)?;

    // the card renders the button twice (inline and hover overlay)
    let add_button = Selector::scoped(".single-products", title, "a.add-to-cart");
    ctx.click_forced(&add_button, timeouts.default_command)
        .await?;

    ctx.expect_text(
        &Selector::css(".modal-content .modal-header h4"),
        TextCheck::Contains,
        "Added!",
        timeouts.element,
    )
    .await?;
    ctx.wait_visible(
        &Selector::css_with_text(".modal-body", "Your product has been added to cart."),
        timeouts.default_command,
    )
    .await?;
    ctx.click_visible(
        &Selector::css_with_text(".modal-footer button.btn", "Continue Shopping"),
        timeouts.default_command,
    )
    .await?;
    tracing::debug!(product, "product added");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::{FlowConfig, Timeouts};
    use crate::session::BrowserSession;
    use crate::simulated::{Account, SimulatedStore};
    use crate::ErrorKind;
    use std::time::Duration;

    const BASE: &str = "https://shop.test";

    fn config() -> FlowConfig {
        FlowConfig::new()
            .with_base_url(BASE)
            .with_timeouts(Timeouts::uniform(300, 10))
    }

    fn store() -> SimulatedStore {
        SimulatedStore::new(BASE).with_account(Account::new("qa@shop.test", "s3cret"))
    }

    mod login_tests {
        use super::*;

        #[tokio::test]
        async fn test_valid_credentials_show_banner() {
            let config = config();
            let store = store();
            let ctx = FlowContext::new(&store, &config);

            login(&ctx, &Credentials::new("qa@shop.test", "s3cret"))
                .await
                .unwrap();

            assert!(store.is_logged_in().unwrap());
            let banner = store
                .probe(&Selector::text(LOGGED_IN_TEXT))
                .await
                .unwrap()
                .unwrap();
            assert!(banner.visible);
        }

        #[tokio::test]
        async fn test_wrong_password_times_out() {
            let config = config();
            let store = store();
            let ctx = FlowContext::new(&store, &config);

            let err = login(&ctx, &Credentials::new("qa@shop.test", "wrong"))
                .await
                .unwrap_err();

            assert_eq!(err.kind(), ErrorKind::Timeout);
            assert!(err.to_string().contains(LOGGED_IN_TEXT));
            assert!(!store.is_logged_in().unwrap());
        }
    }

    mod cart_tests {
        use super::*;

        #[tokio::test]
        async fn test_adds_exactly_one_item() {
            let config = config();
            let store = store();
            let ctx = FlowContext::new(&store, &config);

            add_product_to_cart(&ctx, "Blue Top").await.unwrap();
            assert_eq!(store.cart_items().unwrap(), vec!["Blue Top".to_string()]);
            assert!(!store.modal_open().unwrap());
            assert_eq!(store.current_path().unwrap(), "/products");

            add_product_to_cart(&ctx, "Winter Top").await.unwrap();
            assert_eq!(store.cart_len().unwrap(), 2);
        }

        #[tokio::test]
        async fn test_unknown_product_is_not_found() {
            let config = config();
            let store = store();
            let ctx = FlowContext::new(&store, &config);

            let err = add_product_to_cart(&ctx, "Purple Cape").await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NotFound);
            assert_eq!(store.cart_len().unwrap(), 0);
        }

        #[tokio::test]
        async fn test_match_is_case_sensitive() {
            let config = config();
            let store = store();
            let ctx = FlowContext::new(&store, &config);

            let err = add_product_to_cart(&ctx, "blue top").await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NotFound);
        }

        #[tokio::test]
        async fn test_missing_overlay_fails_on_added_title() {
            let config = config();
            let store = store().without_cart_overlay();
            let ctx = FlowContext::new(&store, &config);

            let err = add_product_to_cart(&ctx, "Blue Top").await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::AssertionMismatch);
            assert!(err.to_string().contains("Added!"));
            assert_eq!(store.cart_len().unwrap(), 1);
        }

        #[tokio::test]
        async fn test_waits_through_slow_rendering() {
            let config = FlowConfig::new()
                .with_base_url(BASE)
                .with_timeouts(Timeouts::uniform(2_000, 10));
            let store = store().with_render_delay(Duration::from_millis(40));
            let ctx = FlowContext::new(&store, &config);

            add_product_to_cart(&ctx, "Stylish Dress").await.unwrap();
            assert_eq!(store.cart_len().unwrap(), 1);
        }
    }
}
