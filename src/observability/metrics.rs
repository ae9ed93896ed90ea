use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub deliveries_created_total: IntCounter,
    pub claims_total: IntCounterVec,
    pub transitions_total: IntCounterVec,
    pub ratings_total: IntCounter,
    pub deliveries_active: IntGauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let deliveries_created_total = IntCounter::new(
            "deliveries_created_total",
            "Total deliveries accepted into the registry",
        )
        .expect("valid deliveries_created_total metric");

        let claims_total = IntCounterVec::new(
            Opts::new("claims_total", "Claim attempts by outcome"),
            &["outcome"],
        )
        .expect("valid claims_total metric");

        let transitions_total = IntCounterVec::new(
            Opts::new("transitions_total", "Lifecycle transitions by event"),
            &["event"],
        )
        .expect("valid transitions_total metric");

        let ratings_total = IntCounter::new("ratings_total", "Ratings successfully attached")
            .expect("valid ratings_total metric");

        let deliveries_active = IntGauge::new(
            "deliveries_active",
            "Deliveries currently claimed and not yet delivered",
        )
        .expect("valid deliveries_active metric");

        registry
            .register(Box::new(deliveries_created_total.clone()))
            .expect("register deliveries_created_total");
        registry
            .register(Box::new(claims_total.clone()))
            .expect("register claims_total");
        registry
            .register(Box::new(transitions_total.clone()))
            .expect("register transitions_total");
        registry
            .register(Box::new(ratings_total.clone()))
            .expect("register ratings_total");
        registry
            .register(Box::new(deliveries_active.clone()))
            .expect("register deliveries_active");

        Self {
            registry,
            deliveries_created_total,
            claims_total,
            transitions_total,
            ratings_total,
            deliveries_active,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}
