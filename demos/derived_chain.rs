//! Derived-asset chain example.
//!
//! Builds a two-level composition (vault share → wrapper → WETH),
//! pushes a deposit down the chain, and shows how a breached protocol
//! ceiling rolls the whole operation back.

use collateral_engine::prelude::*;
use std::sync::Arc;

fn main() {
    env_logger::init();

    println!("╔════════════════════════════════════════════════╗");
    println!("║  collateral-engine: Derived Chain Example      ║");
    println!("╚════════════════════════════════════════════════╝\n");

    let manager = AccountId::new("risk-manager");
    let pool = Creditor::new("POOL-USDC");
    let weth = AssetKey::fungible("WETH");
    let wweth = AssetKey::fungible("wWETH");
    let share = AssetKey::fungible("vWETH-SHARE");

    let mut oracle = FixedRateOracle::new();
    oracle.set_rate(weth.clone(), 2000 * PRICE_PRECISION);

    let mut registry = Registry::new(Arc::new(SingleManager::new(manager.clone())));

    let primary =
        registry.register_module(ModuleKind::Primary(PrimaryAssetModule::new(Arc::new(oracle))));
    registry.add_asset(primary, weth.clone()).unwrap();
    registry
        .set_risk_parameters_of_primary_asset(&manager, &pool, &weth, 1_000_000, 8000, 9000)
        .unwrap();

    // wWETH wraps WETH one to one
    let wrap_module = registry.register_module(ModuleKind::Derived(DerivedAssetModule::new(
        Arc::new(OneToOne),
    )));
    registry
        .add_derived_asset(wrap_module, wweth.clone(), vec![weth.clone()])
        .unwrap();
    registry
        .set_risk_parameters_of_derived_asset(&manager, &pool, &wweth, 10_000_000, 9500)
        .unwrap();

    // each vault share is worth 2 wWETH
    let vault_module = registry.register_module(ModuleKind::Derived(DerivedAssetModule::new(
        Arc::new(FixedRatio {
            numerator: 2,
            denominator: 1,
        }),
    )));
    registry
        .add_derived_asset(vault_module, share.clone(), vec![wweth.clone()])
        .unwrap();
    registry
        .set_risk_parameters_of_derived_asset(&manager, &pool, &share, 500_000, 9000)
        .unwrap();

    println!("━━━ Composition ━━━\n");
    println!("  {share} → {wweth} → {weth}");
    println!("  chain depth: {}\n", registry.composition().depth_of(&share));

    println!("━━━ Scenario 1: Deposit propagates down ━━━\n");

    let (usd, _) = registry.process_deposit(&pool, &share, 100).unwrap();
    println!("Deposited:           100 {share}");
    println!("USD value:           ${}", usd);
    println!(
        "Exposure at {weth}:  {} units",
        registry.risk_params(&pool, &weth).unwrap().last_exposure_asset
    );
    println!(
        "USD at {wweth}:      ${}",
        registry.usd_value_exposure_to_asset(&pool, &wweth).unwrap()
    );
    println!();

    println!("━━━ Scenario 2: Protocol ceiling rolls everything back ━━━\n");

    // the vault's ceiling is 500_000 usd; this deposit would land at
    // 800_000 and must leave no trace anywhere in the chain
    match registry.process_deposit(&pool, &share, 100) {
        Ok(_) => unreachable!(),
        Err(err) => println!("Second deposit rejected: {err}"),
    }
    println!(
        "Exposure at {weth} still: {} units",
        registry.risk_params(&pool, &weth).unwrap().last_exposure_asset
    );
    println!(
        "USD at {share} still:     ${}",
        registry.usd_value_exposure_to_asset(&pool, &share).unwrap()
    );
}
