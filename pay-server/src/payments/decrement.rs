//! Inventory decrement protocol
//!
//! 结清后的唯一副作用：把订单行映射到食材增量，一次事务写入库存台账，
//! 再把当日消耗累加到消费日志。数量全程用 [`Decimal`] 计算，
//! 不经过二进制浮点。
//!
//! 协议只信任订单记录里的行快照，回调报文中的 item_details 一律忽略。

use crate::core::config::ConsumableBasis;
use crate::db::models::{FulfillmentMode, MenuItem, OrderLine};
use crate::db::repository::{
    ConsumptionLogRepository, InventoryRepository, MenuItemRepository, OutflowEntry, StockDelta,
};
use crate::utils::time;
use chrono_tz::Tz;
use rust_decimal::Decimal;
use shared::error::{AppError, AppResult};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

/// Result of one protocol run
#[derive(Debug, Clone, Default)]
pub struct DecrementOutcome {
    /// Deltas committed to the inventory ledger (all negative)
    pub applied: Vec<StockDelta>,
    /// Non-fatal issues (missing menu items, missing consumables)
    pub warnings: Vec<String>,
}

/// Aggregate per-ingredient consumption for a set of order lines
///
/// 同一食材出现在多个菜品里会先合并，再落一条 `+=` 语句。
/// 返回值为负数增量 (消耗)。引用了不存在菜单项的行被跳过。
pub fn aggregate_ingredient_deltas(
    items: &[OrderLine],
    menus: &HashMap<String, MenuItem>,
) -> (BTreeMap<String, Decimal>, Vec<String>) {
    let mut deltas: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut warnings = Vec::new();

    for line in items {
        let Some(menu) = menus.get(&line.menu_item_id) else {
            warnings.push(format!(
                "Menu item {} not found, skipping ingredient decrement",
                line.menu_item_id
            ));
            continue;
        };

        let quantity = Decimal::from(line.quantity);
        for req in &menu.required_ingredients {
            let consumed = req.quantity_per_unit * quantity;
            *deltas.entry(req.ingredient_id.clone()).or_default() -= consumed;
        }
    }

    (deltas, warnings)
}

/// Units of each takeaway consumable for one order
pub fn consumable_units(items: &[OrderLine], basis: ConsumableBasis) -> Decimal {
    match basis {
        ConsumableBasis::PerItemTotal => items
            .iter()
            .map(|line| Decimal::from(line.quantity))
            .sum(),
        ConsumableBasis::PerOrder => Decimal::ONE,
    }
}

/// The decrement side of settlement
///
/// 调用方 (对账引擎) 负责幂等门闩；本协议假定自己最多被调用一次。
#[derive(Clone)]
pub struct DecrementProtocol {
    menu: MenuItemRepository,
    inventory: InventoryRepository,
    consumption: ConsumptionLogRepository,
    consumables: Vec<String>,
    basis: ConsumableBasis,
    tz: Tz,
}

impl DecrementProtocol {
    pub fn new(
        db: Surreal<Db>,
        consumables: Vec<String>,
        basis: ConsumableBasis,
        tz: Tz,
    ) -> Self {
        Self {
            menu: MenuItemRepository::new(db.clone()),
            inventory: InventoryRepository::new(db.clone()),
            consumption: ConsumptionLogRepository::new(db),
            consumables,
            basis,
            tz,
        }
    }

    /// Decrement stock for a settled order and accumulate the daily log
    pub async fn run(
        &self,
        items: &[OrderLine],
        fulfillment: FulfillmentMode,
    ) -> AppResult<DecrementOutcome> {
        let menu_ids: Vec<String> = items
            .iter()
            .map(|line| line.menu_item_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let menus = self.menu.find_by_ids(&menu_ids).await.map_err(AppError::from)?;

        let (mut deltas, mut warnings) = aggregate_ingredient_deltas(items, &menus);
        for w in &warnings {
            tracing::warn!("{}", w);
        }

        // 打包单额外消耗一次性耗材 (按库存名配置)
        if fulfillment == FulfillmentMode::TakeAway && !self.consumables.is_empty() {
            let units = consumable_units(items, self.basis);
            let found = self
                .inventory
                .find_by_names(&self.consumables)
                .await
                .map_err(AppError::from)?;

            for name in &self.consumables {
                match found.iter().find(|item| &item.name == name) {
                    Some(item) => {
                        if let Some(id) = &item.id {
                            *deltas.entry(id.key().to_string()).or_default() -= units;
                        }
                    }
                    None => {
                        let w = format!("Consumable '{}' not found in inventory, skipping", name);
                        tracing::warn!("{}", w);
                        warnings.push(w);
                    }
                }
            }
        }

        deltas.retain(|_, delta| !delta.is_zero());
        if deltas.is_empty() {
            return Ok(DecrementOutcome {
                applied: Vec::new(),
                warnings,
            });
        }

        // 扣减前解析物料元数据，消费日志需要展示名/分类/单位
        let item_ids: Vec<String> = deltas.keys().cloned().collect();
        let ledger = self
            .inventory
            .find_by_ids(&item_ids)
            .await
            .map_err(AppError::from)?;

        let mut applied = Vec::new();
        let mut log_entries = Vec::new();
        for (item_id, delta) in deltas {
            match ledger.get(&item_id) {
                Some(item) => {
                    log_entries.push(OutflowEntry {
                        item_id: item_id.clone(),
                        display_name: item.name.clone(),
                        category: item.category.clone(),
                        unit: item.unit.clone(),
                        quantity: -delta,
                    });
                    applied.push(StockDelta { item_id, delta });
                }
                None => {
                    let w = format!(
                        "Ingredient {} not found in inventory, skipping decrement",
                        item_id
                    );
                    tracing::warn!("{}", w);
                    warnings.push(w);
                }
            }
        }

        self.inventory
            .apply_deltas(&applied)
            .await
            .map_err(AppError::from)?;

        // 台账已提交后日志失败只告警，不回滚扣减
        let date = time::today(self.tz);
        if let Err(e) = self.consumption.accumulate_outflow(&date, &log_entries).await {
            tracing::warn!(error = %e, date = %date, "Consumption log accumulation failed");
            warnings.push(format!("Consumption log accumulation failed: {e}"));
        }

        Ok(DecrementOutcome { applied, warnings })
    }
}
