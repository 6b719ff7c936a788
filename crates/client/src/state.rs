//! Application state: the session, the cart and the backend clients, wired together.
//!
//! Front-end screens call into [`AppState`] rather than the pieces directly,
//! so the cross-cutting rules live in one place: cart edits are persisted
//! immediately, credentials come from the session, and the cart is cleared
//! only after a sale has actually been created.

use std::sync::Arc;

use secrecy::SecretString;
use smartsales_core::{Credential, ProductId, SaleId};
use tracing::instrument;

use crate::api::{
    ApiError, CatalogClient, DownloadedFile, FileFormat, HttpClient, RegistrationForm, SaleRecord,
    SalesClient, UsersClient,
};
use crate::cart::{Cart, CartLine, CartProduct};
use crate::checkout::{CheckoutFlow, SaleResult};
use crate::config::{ApiConfig, ClientConfig};
use crate::error::{AppError, Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::session::{SessionStore, SessionUser};
use crate::storage::{FileStorage, Storage};

/// Client-side application state.
pub struct AppState {
    storage: Arc<dyn Storage>,
    session: SessionStore,
    cart: Cart,
    checkout: CheckoutFlow,
    users: UsersClient,
    sales: SalesClient,
    catalog: CatalogClient,
}

impl AppState {
    /// Create the state from configuration, backed by the storage file in
    /// the configured data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage file cannot be read or the HTTP client
    /// cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let storage = FileStorage::open(config.storage_path())?;
        Self::with_storage(&config.api, Arc::new(storage))
    }

    /// Create the state over an explicit storage backend.
    ///
    /// Hydrates the session and loads the persisted cart.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read or the HTTP client cannot
    /// be built.
    pub fn with_storage(api: &ApiConfig, storage: Arc<dyn Storage>) -> Result<Self> {
        let http = HttpClient::new(api)?;

        let mut session = SessionStore::new(Arc::clone(&storage));
        session.hydrate()?;
        if let Some(user) = session.user() {
            set_sentry_user(&user.id, &user.username, Some(user.email.as_str()));
        }

        let cart = Cart::load(storage.as_ref())?;

        Ok(Self {
            storage,
            session,
            cart,
            checkout: CheckoutFlow::new(),
            users: UsersClient::new(http.clone()),
            sales: SalesClient::new(http.clone()),
            catalog: CatalogClient::new(http),
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub const fn session(&self) -> &SessionStore {
        &self.session
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    #[must_use]
    pub const fn checkout_flow(&self) -> &CheckoutFlow {
        &self.checkout
    }

    #[must_use]
    pub const fn catalog(&self) -> &CatalogClient {
        &self.catalog
    }

    #[must_use]
    pub const fn sales(&self) -> &SalesClient {
        &self.sales
    }

    #[must_use]
    pub const fn users(&self) -> &UsersClient {
        &self.users
    }

    /// The credential for backend calls.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotAuthenticated` if nobody is logged in.
    pub fn require_credential(&self) -> Result<&Credential> {
        self.session.credential().ok_or(AppError::NotAuthenticated)
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Log in and persist the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the credentials or the session
    /// cannot be persisted. The previous session is kept in either case.
    #[instrument(skip(self, password))]
    pub async fn login(&mut self, username: &str, password: &SecretString) -> Result<&SessionUser> {
        let auth = self.users.login(username, password).await?;
        self.start_session(auth.user, auth.credential)
    }

    /// Register a new account and log in as it.
    ///
    /// # Errors
    ///
    /// Returns an error if the form is invalid, the backend refuses it, or
    /// the session cannot be persisted.
    #[instrument(skip(self, form), fields(username = %form.username))]
    pub async fn register(&mut self, form: &RegistrationForm) -> Result<&SessionUser> {
        let auth = self.users.register(form).await?;
        self.start_session(auth.user, auth.credential)
    }

    fn start_session(&mut self, user: SessionUser, credential: Credential) -> Result<&SessionUser> {
        self.session.login(user, credential)?;
        let user = self.session.user().ok_or(AppError::NotAuthenticated)?;

        set_sentry_user(&user.id, &user.username, Some(user.email.as_str()));
        add_breadcrumb("auth", "Logged in", Some(&[("username", user.username.as_str())]));
        Ok(user)
    }

    /// Log out locally, telling the backend on a best-effort basis.
    ///
    /// The cart is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted session cannot be removed.
    #[instrument(skip(self))]
    pub async fn logout(&mut self) -> Result<()> {
        if let Some(credential) = self.session.credential()
            && let Err(e) = self.users.remote_logout(credential).await
        {
            tracing::warn!(error = %e, "Backend logout failed, clearing local session anyway");
        }

        add_breadcrumb("auth", "Logged out", None);
        clear_sentry_user();
        self.session.logout()?;
        Ok(())
    }

    /// Check the stored credential against the backend, logging out locally
    /// if it has been revoked.
    ///
    /// Returns whether the session is still valid. Connectivity problems are
    /// reported as errors and leave the session alone.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached or the session
    /// cannot be cleared.
    #[instrument(skip(self))]
    pub async fn verify_session(&mut self) -> Result<bool> {
        let Some(credential) = self.session.credential() else {
            return Ok(false);
        };

        match self.users.current_user(credential).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_unauthorized() => {
                tracing::info!("Stored credential was rejected, logging out");
                clear_sentry_user();
                self.session.logout()?;
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Look a product up in the catalog and add one unit of it to the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the product cannot be fetched or the cart cannot
    /// be saved.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_to_cart(&mut self, product_id: ProductId) -> Result<CartLine> {
        let product = self.catalog.product(product_id).await.map_err(|e| match e {
            ApiError::Rejected { status: 404, .. } => {
                AppError::NotFound(format!("product {product_id}"))
            }
            other => other.into(),
        })?;
        if !product.active {
            return Err(AppError::NotFound(format!("product {product_id}")));
        }
        self.add_product(CartProduct::from(&product))
    }

    /// Add one unit of `product` to the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be saved.
    pub fn add_product(&mut self, product: CartProduct) -> Result<CartLine> {
        let line = self.cart.add_item(product).clone();
        add_breadcrumb("cart", "Added item", Some(&[("product_id", line.id.as_str())]));
        self.save_cart()?;
        Ok(line)
    }

    /// Set the quantity of a cart line. Zero or less removes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be saved.
    pub fn set_quantity(&mut self, id: &str, quantity: i64) -> Result<()> {
        self.cart.set_quantity(id, quantity);
        add_breadcrumb(
            "cart",
            "Changed quantity",
            Some(&[("product_id", id), ("quantity", quantity.to_string().as_str())]),
        );
        self.save_cart()
    }

    /// Remove a cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be saved.
    pub fn remove_from_cart(&mut self, id: &str) -> Result<()> {
        self.cart.remove_item(id);
        add_breadcrumb("cart", "Removed item", Some(&[("product_id", id)]));
        self.save_cart()
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be saved.
    pub fn clear_cart(&mut self) -> Result<()> {
        self.cart.clear();
        self.save_cart()
    }

    fn save_cart(&self) -> Result<()> {
        self.cart.save(self.storage.as_ref())?;
        Ok(())
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Select the payment method for the next checkout.
    pub fn select_payment_method(&mut self, label: &str) {
        self.checkout.select_method(label);
    }

    /// Submit the cart as a sale with the selected payment method.
    ///
    /// The cart is cleared (and the empty cart persisted) only when the sale
    /// was created. On any failure the cart is left exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Checkout` if no sale was created.
    #[instrument(skip(self), fields(method = %self.checkout.method(), items = self.cart.len()))]
    pub async fn checkout(&mut self) -> Result<SaleResult> {
        add_breadcrumb("checkout", "Confirmed checkout", None);

        let lines = self.cart.snapshot();
        let sale = self
            .checkout
            .confirm(&self.sales, &lines, self.session.credential())
            .await?;

        self.cart.clear();
        if let Err(e) = self.save_cart() {
            // The sale exists; a stale persisted cart is the lesser problem.
            e.report();
        }

        add_breadcrumb(
            "checkout",
            "Sale created",
            Some(&[(
                "sale_id",
                sale.id.map(|id| id.to_string()).unwrap_or_default().as_str(),
            )]),
        );
        Ok(sale)
    }

    // =========================================================================
    // Sales
    // =========================================================================

    /// Sales of the logged-in user.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotAuthenticated` if nobody is logged in, or an
    /// error if the request fails.
    pub async fn sales_history(&self) -> Result<Vec<SaleRecord>> {
        let credential = self.require_credential()?;
        Ok(self.sales.sales_history(credential).await?)
    }

    /// Download a sale receipt.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotAuthenticated` if nobody is logged in, or an
    /// error if the request fails.
    pub async fn download_sale(&self, sale_id: SaleId, format: FileFormat) -> Result<DownloadedFile> {
        let credential = self.require_credential()?;
        Ok(self
            .sales
            .download_sale_file(sale_id, format, credential)
            .await?)
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("session", &self.session)
            .field("cart", &self.cart)
            .field("checkout", &self.checkout)
            .finish_non_exhaustive()
    }
}
