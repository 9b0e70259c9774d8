use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Semaphore;

use daily_car_card::catalog::Catalog;
use daily_car_card::clients::{CarPrompt, ImageGenerationError, ImageGenerator, MockImageGenerator};
use daily_car_card::repositories::JsonFileCardStore;
use daily_car_card::services::card_compositor::CardCompositor;
use daily_car_card::services::{CardOutcome, CardService, CardServiceError};

/// Cuenta las llamadas y devuelve el PNG del mock
#[derive(Default)]
struct CountingGenerator {
    calls: AtomicUsize,
}

#[async_trait]
impl ImageGenerator for CountingGenerator {
    async fn generate(&self, _prompt: &CarPrompt) -> Result<Vec<u8>, ImageGenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(MockImageGenerator::placeholder_png())
    }
}

/// Se queda esperando hasta que el test libere un permiso
struct GatedGenerator {
    calls: AtomicUsize,
    gate: Semaphore,
}

#[async_trait]
impl ImageGenerator for GatedGenerator {
    async fn generate(&self, _prompt: &CarPrompt) -> Result<Vec<u8>, ImageGenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| ImageGenerationError::MissingData)?;
        Ok(MockImageGenerator::placeholder_png())
    }
}

/// Falla las primeras `failures` llamadas
struct FlakyGenerator {
    calls: AtomicUsize,
    failures: usize,
}

#[async_trait]
impl ImageGenerator for FlakyGenerator {
    async fn generate(&self, _prompt: &CarPrompt) -> Result<Vec<u8>, ImageGenerationError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(ImageGenerationError::Api {
                status: 500,
                body: "upstream error".to_string(),
            });
        }
        Ok(MockImageGenerator::placeholder_png())
    }
}

/// Nunca termina a tiempo
struct HangingGenerator;

#[async_trait]
impl ImageGenerator for HangingGenerator {
    async fn generate(&self, _prompt: &CarPrompt) -> Result<Vec<u8>, ImageGenerationError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(MockImageGenerator::placeholder_png())
    }
}

/// Lento solo en la primera llamada
struct SlowFirstGenerator {
    calls: AtomicUsize,
    delay: Duration,
}

#[async_trait]
impl ImageGenerator for SlowFirstGenerator {
    async fn generate(&self, _prompt: &CarPrompt) -> Result<Vec<u8>, ImageGenerationError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            tokio::time::sleep(self.delay).await;
        }
        Ok(MockImageGenerator::placeholder_png())
    }
}

fn service_with(dir: &TempDir, generator: Arc<dyn ImageGenerator>) -> CardService {
    CardService::new(
        Arc::new(Catalog::builtin().unwrap()),
        Arc::new(JsonFileCardStore::new(dir.path().join("meta.json"))),
        generator,
        Arc::new(CardCompositor::new(None)),
        dir.path().join("images"),
    )
    .with_rng_seed(42)
}

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

#[tokio::test]
async fn test_second_request_reuses_stored_card() {
    let dir = TempDir::new().unwrap();
    let generator = Arc::new(CountingGenerator::default());
    let service = service_with(&dir, generator.clone());

    let first = service.get_or_generate(date("2025-03-10")).await.unwrap();
    let second = service.get_or_generate(date("2025-03-10")).await.unwrap();

    assert!(matches!(first, CardOutcome::Ready(_)));
    assert_eq!(first, second);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_different_dates_get_their_own_cards() {
    let dir = TempDir::new().unwrap();
    let generator = Arc::new(CountingGenerator::default());
    let service = service_with(&dir, generator.clone());

    for day in ["2025-03-10", "2025-03-11", "2025-03-12"] {
        service.get_or_generate(date(day)).await.unwrap();
    }

    let all = service.list_all().await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 3);

    // Sin repetición dentro del año mientras queden candidatos
    let mut ids: Vec<&str> = all.values().map(|r| r.car.id.as_str()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 3);
}

#[tokio::test]
async fn test_requests_during_generation_get_generating() {
    let dir = TempDir::new().unwrap();
    let generator = Arc::new(GatedGenerator {
        calls: AtomicUsize::new(0),
        gate: Semaphore::new(0),
    });
    let service = service_with(&dir, generator.clone());
    let day = date("2025-03-10");

    let first = tokio::spawn({
        let service = service.clone();
        async move { service.get_or_generate(day).await }
    });

    // Esperar a que la primera request tenga el lock
    while generator.calls.load(Ordering::SeqCst) == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(service.locks().is_locked(day));

    for _ in 0..5 {
        let outcome = service.get_or_generate(day).await.unwrap();
        assert_eq!(outcome, CardOutcome::Generating);
    }

    generator.gate.add_permits(1);
    let outcome = first.await.unwrap().unwrap();
    assert!(matches!(outcome, CardOutcome::Ready(_)));
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    assert!(!service.locks().is_locked(day));
}

#[tokio::test]
async fn test_concurrent_requests_generate_once() {
    let dir = TempDir::new().unwrap();
    let generator = Arc::new(CountingGenerator::default());
    let service = service_with(&dir, generator.clone());
    let day = date("2025-07-01");

    let outcomes = futures::future::join_all((0..8).map(|_| service.get_or_generate(day))).await;

    let ready: Vec<_> = outcomes
        .into_iter()
        .map(Result::unwrap)
        .filter_map(|outcome| match outcome {
            CardOutcome::Ready(record) => Some(record),
            CardOutcome::Generating => None,
        })
        .collect();

    assert!(!ready.is_empty());
    assert!(ready.iter().all(|record| record == &ready[0]));
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failed_generation_releases_lock_and_can_retry() {
    let dir = TempDir::new().unwrap();
    let generator = Arc::new(FlakyGenerator {
        calls: AtomicUsize::new(0),
        failures: 1,
    });
    let service = service_with(&dir, generator.clone());
    let day = date("2025-03-10");

    let error = service.get_or_generate(day).await.unwrap_err();
    assert!(matches!(error, CardServiceError::ImageGeneration(_)));
    assert!(!service.locks().is_locked(day));
    assert_eq!(service.get_existing(day).await.unwrap(), None);

    let outcome = service.get_or_generate(day).await.unwrap();
    assert!(matches!(outcome, CardOutcome::Ready(_)));
    assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_timeout_releases_lock() {
    let dir = TempDir::new().unwrap();
    let service = service_with(&dir, Arc::new(HangingGenerator))
        .with_generation_timeout(Some(Duration::from_millis(50)));
    let day = date("2025-03-10");

    let error = service.get_or_generate(day).await.unwrap_err();
    assert!(matches!(error, CardServiceError::TimedOut(d) if d == day));
    assert!(!service.locks().is_locked(day));
    assert_eq!(service.get_existing(day).await.unwrap(), None);
}

#[tokio::test]
async fn test_timed_out_generation_writes_nothing_afterwards() {
    let dir = TempDir::new().unwrap();
    let generator = Arc::new(SlowFirstGenerator {
        calls: AtomicUsize::new(0),
        delay: Duration::from_millis(150),
    });
    let service = service_with(&dir, generator.clone())
        .with_generation_timeout(Some(Duration::from_millis(30)));
    let day = date("2025-03-10");

    let error = service.get_or_generate(day).await.unwrap_err();
    assert!(matches!(error, CardServiceError::TimedOut(_)));

    // El generador lento habría terminado ya: no debe aparecer nada
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(service.get_existing(day).await.unwrap(), None);
    assert!(!service.image_path(day).exists());
    assert!(!service.image_path(day).with_extension("png.tmp").exists());

    // Reintento sin límite: la composición no debe competir con el timeout
    let retry = service_with(&dir, generator.clone());
    let CardOutcome::Ready(record) = retry.get_or_generate(day).await.unwrap() else {
        panic!("se esperaba la carta tras reintentar");
    };
    assert_eq!(record.date, day);
    assert!(retry.image_path(day).exists());
    assert!(!retry.image_path(day).with_extension("png.tmp").exists());
    assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
}
