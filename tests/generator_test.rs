//! Orchestration tests for `RecipeGenerator`.
//!
//! Tiers are in-process mocks with atomic call counters, so these tests
//! never touch the network.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;

use sprout::cache::CacheKey;
use sprout::{
    CacheConfig, GenerationOutcome, GenerationPhase, GenerationRequest, ManualClock, MemoryStore,
    Recipe, RecipeGenerator, RecipeService, Result, ShoppingList, Sprout, SproutError,
};

// ============================================================================
// Mock tiers
// ============================================================================

fn recipe(title: &str) -> Recipe {
    Recipe::new(
        title,
        vec!["1 block tofu".into(), "2 cups broccoli".into()],
        vec!["Press the tofu.".into(), "Stir-fry everything.".into()],
    )
}

/// Tier that answers every call the same way.
struct MockTier {
    name: &'static str,
    calls: AtomicU32,
    recipe: Option<Recipe>,
    image: Option<String>,
    delay: Option<Duration>,
    image_ingredients: Mutex<Vec<String>>,
}

impl MockTier {
    fn ok(name: &'static str, title: &str) -> Arc<Self> {
        Arc::new(Self::build(name, Some(recipe(title)), None))
    }

    fn failing(name: &'static str) -> Arc<Self> {
        Arc::new(Self::build(name, None, None))
    }

    fn slow(name: &'static str, title: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self::build(name, Some(recipe(title)), Some(delay)))
    }

    fn with_image(name: &'static str, image: Option<&str>) -> Arc<Self> {
        let mut tier = Self::build(name, Some(recipe("x")), None);
        tier.image = image.map(str::to_string);
        Arc::new(tier)
    }

    fn build(name: &'static str, recipe: Option<Recipe>, delay: Option<Duration>) -> Self {
        Self {
            name,
            calls: AtomicU32::new(0),
            recipe,
            image: None,
            delay,
            image_ingredients: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    async fn answer(&self) -> Result<Recipe> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.recipe.clone().ok_or(SproutError::Api {
            status: 500,
            message: format!("{} is down", self.name),
        })
    }
}

#[async_trait]
impl RecipeService for MockTier {
    fn name(&self) -> &str {
        self.name
    }

    async fn generate(&self, _request: &GenerationRequest) -> Result<Recipe> {
        self.answer().await
    }

    async fn edit(&self, _recipe: &Recipe, instructions: &str) -> Result<Recipe> {
        let mut edited = self.answer().await?;
        edited.title = format!("{} ({instructions})", edited.title);
        Ok(edited)
    }

    async fn generate_image(&self, _title: &str, ingredients: &[String]) -> Result<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.image_ingredients.lock().unwrap() = ingredients.to_vec();
        Ok(self.image.clone())
    }

    async fn shopping_list(
        &self,
        ingredients: &[String],
        _country: Option<&str>,
    ) -> Result<ShoppingList> {
        self.answer().await?;
        let mut list = ShoppingList::default();
        list.categories
            .insert("Produce".into(), ingredients.to_vec());
        Ok(list)
    }
}

/// Tier whose calls resolve only when the test says so, in call order.
struct GatedTier {
    calls: AtomicU32,
    gates: Mutex<VecDeque<oneshot::Receiver<Result<Recipe>>>>,
}

impl GatedTier {
    fn new(count: usize) -> (Arc<Self>, Vec<oneshot::Sender<Result<Recipe>>>) {
        let mut senders = Vec::new();
        let mut gates = VecDeque::new();
        for _ in 0..count {
            let (tx, rx) = oneshot::channel();
            senders.push(tx);
            gates.push_back(rx);
        }
        let tier = Arc::new(Self {
            calls: AtomicU32::new(0),
            gates: Mutex::new(gates),
        });
        (tier, senders)
    }

    async fn wait_for_calls(&self, n: u32) {
        while self.calls.load(Ordering::SeqCst) < n {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl RecipeService for GatedTier {
    fn name(&self) -> &str {
        "gated"
    }

    async fn generate(&self, _request: &GenerationRequest) -> Result<Recipe> {
        let gate = self.gates.lock().unwrap().pop_front();
        self.calls.fetch_add(1, Ordering::SeqCst);
        match gate {
            Some(rx) => rx.await.unwrap_or(Err(SproutError::EmptyResponse)),
            None => Err(SproutError::EmptyResponse),
        }
    }
}

fn generator(primary: Arc<dyn RecipeService>, fallback: Arc<dyn RecipeService>) -> RecipeGenerator {
    Sprout::builder()
        .primary(primary)
        .fallback(fallback)
        .build()
        .unwrap()
}

fn tofu_request() -> GenerationRequest {
    GenerationRequest::new(["tofu", "broccoli"]).restrictions(["nut-free"])
}

// ============================================================================
// Cache behaviour
// ============================================================================

#[tokio::test]
async fn cache_hit_skips_tiers() {
    let primary = MockTier::ok("primary", "Tofu Stir-Fry");
    let fallback = MockTier::ok("fallback", "Backup");
    let generator = generator(primary.clone(), fallback.clone());

    let first = generator.generate(tofu_request()).await;
    let second = generator.generate(tofu_request()).await;

    assert_eq!(first, second);
    assert_eq!(first.recipe().unwrap().title, "Tofu Stir-Fry");
    assert_eq!(primary.calls(), 1);
    assert_eq!(fallback.calls(), 0);
}

#[tokio::test]
async fn reordered_request_shares_cache_entry() {
    let primary = MockTier::ok("primary", "Tofu Stir-Fry");
    let generator = generator(primary.clone(), MockTier::failing("fallback"));

    generator
        .generate(GenerationRequest::new(["tofu", "broccoli"]).restrictions(["a", "b"]))
        .await;
    let outcome = generator
        .generate(GenerationRequest::new(["broccoli", "tofu"]).restrictions(["b", "a"]))
        .await;

    assert!(outcome.is_fulfilled());
    assert_eq!(primary.calls(), 1);
}

#[tokio::test]
async fn expired_entry_is_refetched() {
    let primary = MockTier::ok("primary", "Tofu Stir-Fry");
    let clock = Arc::new(ManualClock::new(1_000_000));
    let generator = Sprout::builder()
        .primary(primary.clone())
        .clock(clock.clone())
        .cache(CacheConfig::new().ttl(Duration::from_secs(3600)))
        .build()
        .unwrap();

    generator.generate(tofu_request()).await;
    clock.advance(Duration::from_secs(3599));
    generator.generate(tofu_request()).await;
    assert_eq!(primary.calls(), 1);

    clock.advance(Duration::from_secs(1));
    generator.generate(tofu_request()).await;
    assert_eq!(primary.calls(), 2);
}

#[tokio::test]
async fn cache_write_failure_still_fulfils() {
    let primary = MockTier::ok("primary", "Tofu Stir-Fry");
    let store = Arc::new(MemoryStore::new().max_value_bytes(16));
    let generator = Sprout::builder()
        .primary(primary.clone())
        .store(store.clone())
        .build()
        .unwrap();

    let outcome = generator.generate(tofu_request()).await;
    assert_eq!(outcome.recipe().unwrap().title, "Tofu Stir-Fry");
    assert!(store.is_empty());
    assert!(generator.state().error.is_none());

    // Nothing was cached, so the next call goes back to the tier.
    generator.generate(tofu_request()).await;
    assert_eq!(primary.calls(), 2);
}

// ============================================================================
// Tier fallback
// ============================================================================

#[tokio::test]
async fn primary_failure_calls_fallback_once() {
    let primary = MockTier::failing("primary");
    let fallback = MockTier::ok("fallback", "Backup Bowl");
    let generator = generator(primary.clone(), fallback.clone());

    let outcome = generator.generate(tofu_request()).await;

    assert_eq!(outcome.recipe().unwrap().title, "Backup Bowl");
    assert_eq!(primary.calls(), 1);
    assert_eq!(fallback.calls(), 1);

    // Fallback results are cached too.
    generator.generate(tofu_request()).await;
    assert_eq!(primary.calls(), 1);
    assert_eq!(fallback.calls(), 1);
}

#[tokio::test]
async fn both_tiers_failing_rejects() {
    let primary = MockTier::failing("primary");
    let fallback = MockTier::failing("fallback");
    let generator = generator(primary.clone(), fallback.clone());

    let outcome = generator.generate(tofu_request()).await;

    let message = outcome.error().expect("should be rejected");
    assert!(message.starts_with("no recipe could be generated"));
    assert!(message.contains("fallback is down"));
    assert_eq!(primary.calls(), 1);
    assert_eq!(fallback.calls(), 1);

    let state = generator.state();
    assert_eq!(state.phase(), GenerationPhase::Rejected);
    assert!(state.recipe.is_none());
    assert_eq!(state.error.as_deref(), Some(message));
}

#[tokio::test]
async fn failed_generation_is_not_cached() {
    let primary = MockTier::failing("primary");
    let fallback = MockTier::failing("fallback");
    let generator = generator(primary.clone(), fallback.clone());

    generator.generate(tofu_request()).await;
    generator.generate(tofu_request()).await;
    assert_eq!(primary.calls(), 2);
    assert_eq!(fallback.calls(), 2);
}

#[tokio::test]
async fn single_tier_failure_is_terminal() {
    let only = MockTier::failing("only");
    let generator = Sprout::builder().primary(only.clone()).build().unwrap();

    let outcome = generator.generate(tofu_request()).await;
    assert!(outcome.error().unwrap().contains("only is down"));
    assert_eq!(only.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn tier_timeout_moves_to_fallback() {
    let primary = MockTier::slow("primary", "Too Late", Duration::from_secs(30));
    let fallback = MockTier::ok("fallback", "On Time");
    let generator = Sprout::builder()
        .primary(primary.clone())
        .fallback(fallback.clone())
        .tier_timeout(Duration::from_secs(5))
        .build()
        .unwrap();

    let outcome = generator.generate(tofu_request()).await;
    assert_eq!(outcome.recipe().unwrap().title, "On Time");
    assert_eq!(primary.calls(), 1);
    assert_eq!(fallback.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn slow_tier_without_timeout_is_awaited() {
    let primary = MockTier::slow("primary", "Worth The Wait", Duration::from_secs(30));
    let fallback = MockTier::ok("fallback", "Unused");
    let generator = generator(primary.clone(), fallback.clone());

    let outcome = generator.generate(tofu_request()).await;
    assert_eq!(outcome.recipe().unwrap().title, "Worth The Wait");
    assert_eq!(fallback.calls(), 0);
}

// ============================================================================
// Validation
// ============================================================================

#[tokio::test]
async fn empty_ingredients_rejected_without_dispatch() {
    let primary = MockTier::ok("primary", "x");
    let fallback = MockTier::ok("fallback", "y");
    let generator = generator(primary.clone(), fallback.clone());

    let outcome = generator.generate(GenerationRequest::new(["  ", ""])).await;

    assert!(outcome.error().unwrap().contains("ingredient"));
    assert_eq!(primary.calls(), 0);
    assert_eq!(fallback.calls(), 0);
    assert!(!generator.state().is_loading);
}

#[tokio::test]
async fn empty_ingredients_ignore_cached_entries() {
    let primary = MockTier::ok("primary", "x");
    let generator = Sprout::builder().primary(primary.clone()).build().unwrap();

    // Plant an entry under the key an empty request would derive.
    let empty = GenerationRequest::new(Vec::<String>::new());
    generator
        .cache()
        .set(&CacheKey::derive(&empty), &recipe("Planted"));

    let outcome = generator.generate(empty).await;
    assert!(outcome.error().is_some());
}

// ============================================================================
// Observable state and overlapping calls
// ============================================================================

#[tokio::test]
async fn subscriber_sees_pending_then_fulfilled() {
    let (tier, mut gates) = GatedTier::new(1);
    let generator = Arc::new(Sprout::builder().primary(tier.clone()).build().unwrap());
    let mut rx = generator.subscribe();

    let task = tokio::spawn({
        let generator = generator.clone();
        async move { generator.generate(tofu_request()).await }
    });
    tier.wait_for_calls(1).await;

    assert_eq!(rx.borrow_and_update().phase(), GenerationPhase::Pending);
    gates.remove(0).send(Ok(recipe("Gated"))).unwrap();
    assert!(task.await.unwrap().is_fulfilled());

    rx.changed().await.unwrap();
    let state = rx.borrow().clone();
    assert_eq!(state.phase(), GenerationPhase::Fulfilled);
    assert_eq!(state.recipe.unwrap().title, "Gated");
}

#[tokio::test]
async fn newer_call_wins_when_older_settles_last() {
    let (tier, mut gates) = GatedTier::new(2);
    let generator = Arc::new(Sprout::builder().primary(tier.clone()).build().unwrap());
    let request_a = GenerationRequest::new(["lentils"]);
    let request_b = GenerationRequest::new(["chickpeas"]);

    let a = tokio::spawn({
        let generator = generator.clone();
        let request = request_a.clone();
        async move { generator.generate(request).await }
    });
    tier.wait_for_calls(1).await;
    let b = tokio::spawn({
        let generator = generator.clone();
        async move { generator.generate(request_b).await }
    });
    tier.wait_for_calls(2).await;

    let gate_b = gates.pop().unwrap();
    let gate_a = gates.pop().unwrap();

    gate_b.send(Ok(recipe("Chickpea Curry"))).unwrap();
    assert_eq!(
        b.await.unwrap().recipe().unwrap().title,
        "Chickpea Curry"
    );

    gate_a.send(Ok(recipe("Lentil Soup"))).unwrap();
    assert_eq!(a.await.unwrap(), GenerationOutcome::Superseded);

    let state = generator.state();
    assert_eq!(state.recipe.unwrap().title, "Chickpea Curry");
    assert!(!state.is_loading);

    // The superseded result still landed in the cache under its own key.
    let cached = generator.cache().get(&CacheKey::derive(&request_a)).unwrap();
    assert_eq!(cached.recipe.title, "Lentil Soup");
}

#[tokio::test]
async fn stale_call_settling_first_keeps_newer_call_loading() {
    let (tier, mut gates) = GatedTier::new(2);
    let generator = Arc::new(Sprout::builder().primary(tier.clone()).build().unwrap());

    let a = tokio::spawn({
        let generator = generator.clone();
        async move { generator.generate(GenerationRequest::new(["lentils"])).await }
    });
    tier.wait_for_calls(1).await;
    let b = tokio::spawn({
        let generator = generator.clone();
        async move { generator.generate(GenerationRequest::new(["chickpeas"])).await }
    });
    tier.wait_for_calls(2).await;

    let gate_b = gates.pop().unwrap();
    let gate_a = gates.pop().unwrap();

    gate_a.send(Err(SproutError::EmptyResponse)).unwrap();
    assert_eq!(a.await.unwrap(), GenerationOutcome::Superseded);

    let state = generator.state();
    assert!(state.is_loading);
    assert!(state.error.is_none());

    gate_b.send(Ok(recipe("Chickpea Curry"))).unwrap();
    assert!(b.await.unwrap().is_fulfilled());
    assert!(!generator.state().is_loading);
}

#[tokio::test]
async fn dropped_call_clears_loading() {
    let (tier, _gates) = GatedTier::new(1);
    let generator = Sprout::builder().primary(tier.clone()).build().unwrap();

    let result = tokio::time::timeout(
        Duration::from_millis(20),
        generator.generate(tofu_request()),
    )
    .await;

    assert!(result.is_err(), "call should still be pending");
    let state = generator.state();
    assert!(!state.is_loading);
    assert_eq!(state.phase(), GenerationPhase::Idle);
}

// ============================================================================
// Edit, image and shopping list
// ============================================================================

#[tokio::test]
async fn edit_keeps_identity_and_updates_state() {
    let primary = MockTier::ok("primary", "Tofu Stir-Fry");
    let generator = Sprout::builder().primary(primary.clone()).build().unwrap();

    let current = generator
        .generate(tofu_request())
        .await
        .recipe()
        .cloned()
        .unwrap();
    let mut original = current.clone();
    original.id = Some("saved-1".into());

    // Editing a recipe that is not on display leaves the state alone.
    let edited = generator.edit(&original, "spicier").await.unwrap();
    assert_eq!(edited.id.as_deref(), Some("saved-1"));
    assert_eq!(edited.title, "Tofu Stir-Fry (spicier)");
    assert_eq!(generator.state().recipe.unwrap().title, "Tofu Stir-Fry");

    let edited = generator.edit(&current, "less oil").await.unwrap();
    assert_eq!(generator.state().recipe.unwrap(), edited);
}

#[tokio::test]
async fn edit_requires_instructions() {
    let primary = MockTier::ok("primary", "x");
    let generator = Sprout::builder().primary(primary.clone()).build().unwrap();

    let err = generator.edit(&recipe("x"), "   ").await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(primary.calls(), 0);
}

#[tokio::test]
async fn edit_falls_back() {
    let primary = MockTier::failing("primary");
    let fallback = MockTier::ok("fallback", "Fallback Edit");
    let generator = generator(primary.clone(), fallback.clone());

    let edited = generator.edit(&recipe("x"), "vegan cheese").await.unwrap();
    assert_eq!(edited.title, "Fallback Edit (vegan cheese)");
    assert_eq!(primary.calls(), 1);
}

#[tokio::test]
async fn image_limits_ingredients_and_falls_back_when_missing() {
    let primary = MockTier::with_image("primary", None);
    let fallback = MockTier::with_image("fallback", Some("data:image/png;base64,AAAA"));
    let generator = generator(primary.clone(), fallback.clone());
    let ingredients: Vec<String> = (1..=8).map(|i| format!("item {i}")).collect();

    let image = generator
        .generate_image("Green Curry", &ingredients)
        .await
        .unwrap();

    assert_eq!(image.as_deref(), Some("data:image/png;base64,AAAA"));
    assert_eq!(primary.calls(), 1);
    assert_eq!(primary.image_ingredients.lock().unwrap().len(), 5);
    assert_eq!(fallback.image_ingredients.lock().unwrap().len(), 5);
}

#[tokio::test]
async fn image_absent_from_both_tiers_is_none() {
    let generator = generator(
        MockTier::with_image("primary", None),
        MockTier::with_image("fallback", None),
    );
    let image = generator.generate_image("Soup", &[]).await.unwrap();
    assert_eq!(image, None);
}

#[tokio::test]
async fn image_requires_title() {
    let primary = MockTier::with_image("primary", Some("https://img"));
    let generator = Sprout::builder().primary(primary.clone()).build().unwrap();
    assert!(generator.generate_image(" ", &[]).await.unwrap_err().is_validation());
    assert_eq!(primary.calls(), 0);
}

#[tokio::test]
async fn shopping_list_falls_back() {
    let primary = MockTier::failing("primary");
    let fallback = MockTier::ok("fallback", "x");
    let generator = generator(primary.clone(), fallback.clone());

    let list = generator
        .shopping_list(&["tofu".to_string(), "rice".to_string()], Some("UK"))
        .await
        .unwrap();
    assert_eq!(list.items("Produce"), ["tofu", "rice"]);
    assert_eq!(fallback.calls(), 1);
}

#[tokio::test]
async fn tier_operations_do_not_touch_generation_state() {
    let primary = MockTier::ok("primary", "x");
    let generator = Sprout::builder().primary(primary).build().unwrap();

    generator
        .shopping_list(&["tofu".to_string()], None)
        .await
        .unwrap();
    assert_eq!(generator.state().phase(), GenerationPhase::Idle);
}
