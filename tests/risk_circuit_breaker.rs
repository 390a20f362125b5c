//! Scenario 5: circuit breaker trips after consecutive losses and cools
//! down after its window elapses.

use std::thread::sleep;
use std::time::Duration;

use arbiter_core::risk::{CircuitBreaker, CircuitBreakerConfig, CircuitState};

#[test]
fn trips_after_max_consecutive_losses_then_recovers_after_cooldown() {
    let config = CircuitBreakerConfig { max_consecutive_losses: 3, cooldown_seconds: 1, ..CircuitBreakerConfig::default() };
    let mut breaker = CircuitBreaker::new(config);

    breaker.update(1, 0.0, 0.0);
    assert!(breaker.can_trade());
    breaker.update(2, 0.0, 0.0);
    assert!(breaker.can_trade());
    breaker.update(3, 0.0, 0.0);

    assert!(!breaker.can_trade());
    assert_eq!(breaker.state(), CircuitState::Cooldown);

    sleep(Duration::from_millis(1_100));

    assert_eq!(breaker.state(), CircuitState::Normal);
    assert!(breaker.can_trade());
}
