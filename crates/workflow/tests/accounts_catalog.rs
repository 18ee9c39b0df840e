//! Integration tests for accounts, wishlists, reviews and admin catalog
//! management.

use std::collections::BTreeMap;

use auth::{GoogleProfile, TokenService};
use domain::{
    Category, Identity, NewProduct, ProductId, ProductImage, ProductUpdate, ProfileUpdate, Role,
    UserId,
};
use store::{InMemoryStore, ProductQuery, UserStore};
use workflow::{AccountService, CatalogService, ErrorKind};

struct TestHarness {
    store: InMemoryStore,
    accounts: AccountService<InMemoryStore>,
    catalog: CatalogService<InMemoryStore>,
}

impl TestHarness {
    fn new() -> Self {
        let store = InMemoryStore::new();
        Self {
            accounts: AccountService::new(store.clone(), TokenService::new("test-secret", 3600)),
            catalog: CatalogService::new(store.clone()),
            store,
        }
    }

    async fn register(&self, name: &str, email: &str) -> Identity {
        self.accounts
            .register(name, email, "secret123")
            .await
            .unwrap()
            .user
            .identity()
    }

    async fn admin(&self) -> Identity {
        let identity = self.register("Admin", "admin@example.com").await;
        self.store
            .update_user(identity.user_id, |u| {
                u.role = Role::Admin;
                Ok(())
            })
            .await
            .unwrap();
        Identity::new(identity.user_id, Role::Admin)
    }

    async fn product(&self, admin: Identity, name: &str, category: Category, featured: bool) -> ProductId {
        self.catalog
            .create_product(
                admin,
                NewProduct {
                    name: name.to_string(),
                    description: format!("{name} description"),
                    price: 1_000,
                    discount_price: None,
                    category,
                    stock: 10,
                    brand: String::new(),
                    specifications: BTreeMap::new(),
                    images: vec![],
                    is_featured: featured,
                    is_active: true,
                },
            )
            .await
            .unwrap()
            .id
    }
}

#[tokio::test]
async fn register_normalizes_email_and_rejects_duplicates() {
    let h = TestHarness::new();
    let session = h
        .accounts
        .register("Jane", "  Jane@Example.COM ", "secret123")
        .await
        .unwrap();
    assert_eq!(session.user.email.as_str(), "jane@example.com");
    assert_ne!(session.user.password_hash.as_deref(), Some("secret123"));

    let err = h
        .accounts
        .register("Jane Again", "jane@example.com", "secret456")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(h.store.count_users().await.unwrap(), 1);
}

#[tokio::test]
async fn register_rejects_short_password() {
    let h = TestHarness::new();
    let err = h
        .accounts
        .register("Jane", "jane@example.com", "123")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn login_checks_password_and_resolves_token() {
    let h = TestHarness::new();
    let identity = h.register("Jane", "jane@example.com").await;

    let session = h.accounts.login("JANE@example.com", "secret123").await.unwrap();
    assert_eq!(session.user.id, identity.user_id);
    assert_eq!(h.accounts.resolve(&session.token).await.unwrap(), identity);

    let err = h.accounts.login("jane@example.com", "wrong-pass").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert_eq!(err.to_string(), "Invalid email or password");

    let err = h.accounts.login("nobody@example.com", "secret123").await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid email or password");

    let err = h.accounts.login("", "").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn resolve_rejects_tokens_of_deleted_accounts() {
    let h = TestHarness::new();
    let session = h
        .accounts
        .register("Jane", "jane@example.com", "secret123")
        .await
        .unwrap();
    h.store.delete_user(session.user.id).await.unwrap();

    let err = h.accounts.resolve(&session.token).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    let err = h.accounts.resolve("not-a-token").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}

#[tokio::test]
async fn federated_login_creates_links_and_reuses_accounts() {
    let h = TestHarness::new();
    let profile = GoogleProfile {
        id: "google-1".into(),
        name: "Gina".into(),
        email: "gina@example.com".into(),
        avatar: Some("https://example.com/gina.png".into()),
    };

    let first = h.accounts.federated_login(profile.clone()).await.unwrap();
    assert!(first.user.password_hash.is_none());
    assert!(first.user.is_email_verified);
    assert_eq!(first.user.avatar, "https://example.com/gina.png");

    let again = h.accounts.federated_login(profile).await.unwrap();
    assert_eq!(again.user.id, first.user.id);

    // An existing password account gets linked by email
    let jane = h.register("Jane", "jane@example.com").await;
    let linked = h
        .accounts
        .federated_login(GoogleProfile {
            id: "google-2".into(),
            name: "Jane".into(),
            email: "JANE@example.com".into(),
            avatar: None,
        })
        .await
        .unwrap();
    assert_eq!(linked.user.id, jane.user_id);
    assert_eq!(linked.user.google_id.as_deref(), Some("google-2"));
    assert!(linked.user.password_hash.is_some());
    assert_eq!(h.store.count_users().await.unwrap(), 2);
}

#[tokio::test]
async fn change_password_requires_current_password() {
    let h = TestHarness::new();
    let identity = h.register("Jane", "jane@example.com").await;

    let err = h
        .accounts
        .change_password(identity, Some("wrong-pass"), "newsecret")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert_eq!(err.to_string(), "Current password is incorrect");

    let err = h
        .accounts
        .change_password(identity, None, "newsecret")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    h.accounts
        .change_password(identity, Some("secret123"), "newsecret")
        .await
        .unwrap();
    assert!(h.accounts.login("jane@example.com", "newsecret").await.is_ok());
    assert!(h.accounts.login("jane@example.com", "secret123").await.is_err());
}

#[tokio::test]
async fn google_only_account_can_set_first_password() {
    let h = TestHarness::new();
    let session = h
        .accounts
        .federated_login(GoogleProfile {
            id: "google-9".into(),
            name: "Gus".into(),
            email: "gus@example.com".into(),
            avatar: None,
        })
        .await
        .unwrap();

    h.accounts
        .change_password(session.user.identity(), None, "firstpass")
        .await
        .unwrap();
    assert!(h.accounts.login("gus@example.com", "firstpass").await.is_ok());
}

#[tokio::test]
async fn profile_update_renormalizes_email_and_detects_conflicts() {
    let h = TestHarness::new();
    let jane = h.register("Jane", "jane@example.com").await;
    h.register("John", "john@example.com").await;

    let updated = h
        .accounts
        .update_profile(
            jane,
            ProfileUpdate {
                email: Some(" Jane.Doe@Example.com ".into()),
                phone: Some("555-0101".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.email.as_str(), "jane.doe@example.com");
    assert_eq!(updated.phone, "555-0101");

    let err = h
        .accounts
        .update_profile(
            jane,
            ProfileUpdate {
                email: Some("john@example.com".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn wishlist_membership_is_unique() {
    let h = TestHarness::new();
    let admin = h.admin().await;
    let jane = h.register("Jane", "jane@example.com").await;
    let product = h.product(admin, "Kettle", Category::HomeAndKitchen, false).await;

    let wishlist = h.accounts.add_to_wishlist(jane, product).await.unwrap();
    assert_eq!(wishlist.len(), 1);

    let err = h.accounts.add_to_wishlist(jane, product).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(err.to_string(), "Product already in wishlist");

    let err = h
        .accounts
        .add_to_wishlist(jane, ProductId::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let wishlist = h.accounts.remove_from_wishlist(jane, product).await.unwrap();
    assert!(wishlist.is_empty());
}

#[tokio::test]
async fn admin_user_management() {
    let h = TestHarness::new();
    let admin = h.admin().await;
    let jane = h.register("Jane", "jane@example.com").await;

    assert_eq!(h.accounts.list_users(admin).await.unwrap().len(), 2);
    let err = h.accounts.list_users(jane).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let promoted = h.accounts.set_role(admin, jane.user_id, Role::Admin).await.unwrap();
    assert_eq!(promoted.role, Role::Admin);

    h.accounts.delete_user(admin, jane.user_id).await.unwrap();
    let err = h.accounts.delete_user(admin, jane.user_id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = h
        .accounts
        .set_role(admin, UserId::new(), Role::User)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "User not found");
}

#[tokio::test]
async fn one_review_per_user_with_rounded_rating() {
    let h = TestHarness::new();
    let admin = h.admin().await;
    let product = h.product(admin, "Speaker", Category::Electronics, false).await;
    let jane = h.register("Jane", "jane@example.com").await;
    let john = h.register("John", "john@example.com").await;
    let jim = h.register("Jim", "jim@example.com").await;

    h.catalog.add_review(jane, product, 5, "Loud".into()).await.unwrap();
    h.catalog.add_review(john, product, 4, "Good".into()).await.unwrap();
    let reviewed = h.catalog.add_review(jim, product, 4, "Fine".into()).await.unwrap();
    assert_eq!(reviewed.num_reviews, 3);
    assert_eq!(reviewed.ratings, 4.3);
    assert_eq!(reviewed.reviews[0].name, "Jane");

    let err = h
        .catalog
        .add_review(jane, product, 1, "Changed my mind".into())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(h.catalog.get(product).await.unwrap().num_reviews, 3);

    let err = h
        .catalog
        .add_review(jane, product, 6, "Off the scale".into())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn featured_related_and_categories() {
    let h = TestHarness::new();
    let admin = h.admin().await;
    let phone = h.product(admin, "Phone", Category::Smartphones, true).await;
    h.product(admin, "Phone Case", Category::Smartphones, false).await;
    h.product(admin, "Novel", Category::Books, true).await;

    let featured = h.catalog.featured().await.unwrap();
    assert_eq!(featured.len(), 2);

    let related = h.catalog.related(phone).await.unwrap();
    assert_eq!(related.len(), 1);
    assert_eq!(related[0].name, "Phone Case");

    let categories = h.catalog.categories().await.unwrap();
    assert_eq!(categories, vec![Category::Smartphones, Category::Books]);

    let page = h
        .catalog
        .list(ProductQuery::new().keyword("phone"))
        .await
        .unwrap();
    assert_eq!(page.total, 2);
}

#[tokio::test]
async fn admin_product_management() {
    let h = TestHarness::new();
    let admin = h.admin().await;
    let jane = h.register("Jane", "jane@example.com").await;
    let id = h.product(admin, "Blender", Category::HomeAndKitchen, false).await;

    let err = h
        .catalog
        .update_product(jane, id, ProductUpdate::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let updated = h
        .catalog
        .update_product(
            admin,
            id,
            ProductUpdate {
                discount_price: Some(800),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.effective_price().cents(), 800);

    let restocked = h.catalog.set_stock(admin, id, 42).await.unwrap();
    assert_eq!(restocked.stock, 42);
    let err = h.catalog.set_stock(admin, id, -1).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let images: Vec<ProductImage> = (0..6)
        .map(|i| ProductImage {
            url: format!("/uploads/{i}.png"),
            alt: None,
        })
        .collect();
    let err = h
        .catalog
        .replace_images(admin, id, images.clone())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    let with_images = h
        .catalog
        .replace_images(admin, id, images[..2].to_vec())
        .await
        .unwrap();
    assert_eq!(with_images.images.len(), 2);

    h.catalog.delete_product(admin, id).await.unwrap();
    let err = h.catalog.get(id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.to_string(), "Product not found");
}

mod span_fields {
    use std::fmt;
    use std::sync::{Arc, Mutex};

    use tracing::field::{Field, Visit};
    use tracing::span::{Attributes, Id, Record};
    use tracing::Subscriber;
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    /// Collects every value recorded on any span.
    #[derive(Clone, Default)]
    pub struct Recorded(pub Arc<Mutex<Vec<String>>>);

    struct Values<'a>(&'a mut Vec<String>);

    impl Visit for Values<'_> {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            self.0.push(format!("{}={value:?}", field.name()));
        }
    }

    impl<S: Subscriber> Layer<S> for Recorded {
        fn on_new_span(&self, attrs: &Attributes<'_>, _: &Id, _: Context<'_, S>) {
            let mut values = self.0.lock().unwrap();
            values.push(format!("span:{}", attrs.metadata().name()));
            attrs.record(&mut Values(&mut values));
        }

        fn on_record(&self, _: &Id, values: &Record<'_>, _: Context<'_, S>) {
            values.record(&mut Values(&mut self.0.lock().unwrap()));
        }
    }

    pub fn install() -> (Recorded, tracing::subscriber::DefaultGuard) {
        let recorded = Recorded::default();
        let subscriber = tracing_subscriber::registry().with(recorded.clone());
        (recorded, tracing::subscriber::set_default(subscriber))
    }
}

#[tokio::test]
async fn credentials_stay_out_of_spans() {
    let (recorded, _guard) = span_fields::install();
    let h = TestHarness::new();

    h.accounts
        .register("Jane", "jane@example.com", "secret123")
        .await
        .unwrap();
    h.accounts
        .login("jane@example.com", "secret123")
        .await
        .unwrap();
    let _ = h.accounts.login("jane@example.com", "wrong-pass").await;

    let values = recorded.0.lock().unwrap();
    assert!(values.iter().any(|v| v == "span:register"));
    assert!(values.iter().any(|v| v == "span:login"));
    for value in values.iter() {
        assert!(!value.contains("jane@example.com"), "leaked: {value}");
        assert!(!value.contains("secret123"), "leaked: {value}");
    }
}
