//! Basic primary-asset exposure example.
//!
//! Demonstrates registering a primary asset, setting its risk
//! parameters, and watching the exposure ceiling reject a deposit.

use collateral_engine::prelude::*;
use std::sync::Arc;

fn main() {
    env_logger::init();

    println!("╔════════════════════════════════════════════════╗");
    println!("║  collateral-engine: Basic Exposure Example     ║");
    println!("╚════════════════════════════════════════════════╝\n");

    let manager = AccountId::new("risk-manager");
    let pool = Creditor::new("POOL-USDC");
    let weth = AssetKey::fungible("WETH");

    // WETH is worth 2000 usd per unit
    let mut oracle = FixedRateOracle::new();
    oracle.set_rate(weth.clone(), 2000 * PRICE_PRECISION);

    let mut registry = Registry::new(Arc::new(SingleManager::new(manager.clone())));
    let primary =
        registry.register_module(ModuleKind::Primary(PrimaryAssetModule::new(Arc::new(oracle))));
    registry.add_asset(primary, weth.clone()).unwrap();

    registry
        .set_risk_parameters_of_primary_asset(&manager, &pool, &weth, 1000, 8000, 9000)
        .unwrap();

    println!("━━━ Scenario 1: Deposit within limits ━━━\n");

    let (usd, _) = registry.process_deposit(&pool, &weth, 500).unwrap();
    let params = registry.risk_params(&pool, &weth).unwrap();
    println!("Deposited:          500 WETH");
    println!("Exposure:           {} / {} units", params.last_exposure_asset, params.max_exposure);
    println!("USD value:          ${}", usd);

    let values = calculate_weighted_risk_values(&[AssetValueAndRiskFactors {
        usd_value: usd,
        collateral_factor: params.collateral_factor,
        liquidation_factor: params.liquidation_factor,
    }])
    .unwrap();
    println!("Collateral value:   ${}", values.collateral_value);
    println!("Liquidation value:  ${}", values.liquidation_value);
    println!();

    println!("━━━ Scenario 2: Deposit over the ceiling ━━━\n");

    match registry.process_deposit(&pool, &weth, 600) {
        Ok(_) => unreachable!(),
        Err(err) => println!("Deposit of 600 more rejected: {err}"),
    }
    let params = registry.risk_params(&pool, &weth).unwrap();
    println!("Exposure unchanged: {} / {} units", params.last_exposure_asset, params.max_exposure);
    println!();

    println!("━━━ Scenario 3: Withdrawal ━━━\n");

    let (usd, _) = registry.process_withdrawal(&pool, &weth, 200).unwrap();
    let params = registry.risk_params(&pool, &weth).unwrap();
    println!("Withdrew:           200 WETH");
    println!("Exposure:           {} / {} units", params.last_exposure_asset, params.max_exposure);
    println!("USD value:          ${}", usd);
}
