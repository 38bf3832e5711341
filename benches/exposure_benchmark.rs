use collateral_engine::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;

fn manager() -> AccountId {
    AccountId::new("risk-manager")
}

/// Registry with one primary asset and a chain of `levels` derived
/// wrappers stacked on top of it, all 1:1.
fn chained_registry(levels: usize) -> (Registry, AssetKey, Creditor) {
    let base = AssetKey::fungible("BASE");
    let pool = Creditor::new("POOL");

    let mut oracle = FixedRateOracle::new();
    oracle.set_rate(base.clone(), PRICE_PRECISION);

    let mut registry = Registry::new(Arc::new(SingleManager::new(manager())));
    let primary =
        registry.register_module(ModuleKind::Primary(PrimaryAssetModule::new(Arc::new(oracle))));
    registry.add_asset(primary, base.clone()).unwrap();
    registry
        .set_risk_parameters_of_primary_asset(&manager(), &pool, &base, u128::MAX, 8000, 9000)
        .unwrap();

    let mut top = base;
    for level in 0..levels {
        let module = registry.register_module(ModuleKind::Derived(DerivedAssetModule::new(
            Arc::new(OneToOne),
        )));
        let wrapped = AssetKey::fungible(format!("WRAP-{level}").as_str());
        registry
            .add_derived_asset(module, wrapped.clone(), vec![top])
            .unwrap();
        registry
            .set_risk_parameters_of_derived_asset(&manager(), &pool, &wrapped, u128::MAX, 9000)
            .unwrap();
        top = wrapped;
    }
    (registry, top, pool)
}

fn exposures(n: usize) -> Vec<AssetValueAndRiskFactors> {
    (0..n)
        .map(|i| AssetValueAndRiskFactors {
            usd_value: 1_000_000 + i as u128 * 37,
            collateral_factor: 8000,
            liquidation_factor: 9000,
        })
        .collect()
}

fn bench_deposit_primary(c: &mut Criterion) {
    let (mut registry, asset, pool) = chained_registry(0);

    c.bench_function("deposit_primary", |b| {
        b.iter(|| {
            registry
                .process_deposit(black_box(&pool), black_box(&asset), black_box(100))
                .unwrap()
        })
    });
}

fn bench_deposit_chain_depth_5(c: &mut Criterion) {
    let (mut registry, top, pool) = chained_registry(5);

    c.bench_function("deposit_chain_depth_5", |b| {
        b.iter(|| {
            registry
                .process_deposit(black_box(&pool), black_box(&top), black_box(100))
                .unwrap()
        })
    });
}

fn bench_risk_values_10_assets(c: &mut Criterion) {
    let input = exposures(10);

    c.bench_function("risk_values_10_assets", |b| {
        b.iter(|| calculate_weighted_risk_values(black_box(&input)))
    });
}

fn bench_risk_values_1000_assets(c: &mut Criterion) {
    let input = exposures(1000);

    c.bench_function("risk_values_1000_assets", |b| {
        b.iter(|| calculate_weighted_risk_values(black_box(&input)))
    });
}

criterion_group!(
    benches,
    bench_deposit_primary,
    bench_deposit_chain_depth_5,
    bench_risk_values_10_assets,
    bench_risk_values_1000_assets
);
criterion_main!(benches);
