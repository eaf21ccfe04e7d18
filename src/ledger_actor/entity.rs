//! [`ActorEntity`] implementation for [`InventoryItem`].
//!
//! The ledger actor owns every item, so the check-and-decrement in
//! [`LedgerAction::Reserve`] cannot interleave with another reservation on
//! the same item.

use super::{LedgerAction, LedgerActionResult, LedgerError};
use crate::framework::ActorEntity;
use crate::model::{InventoryItem, ItemCreate, ItemId, ItemUpdate, Reservation, TenantId};
use async_trait::async_trait;
use tracing::{info, warn};

impl InventoryItem {
    fn ensure_owned_by(&self, tenant: &TenantId) -> Result<(), LedgerError> {
        if &self.tenant == tenant {
            Ok(())
        } else {
            Err(LedgerError::Unauthorized(self.id))
        }
    }
}

fn validated_name(name: String) -> Result<String, LedgerError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::InvalidItem("name must not be blank".into()));
    }
    Ok(trimmed.to_string())
}

#[async_trait]
impl ActorEntity for InventoryItem {
    type Id = ItemId;
    type Create = ItemCreate;
    type Update = ItemUpdate;
    type Action = LedgerAction;
    type ActionResult = LedgerActionResult;
    type Context = ();
    type Error = LedgerError;

    fn from_create_params(id: ItemId, params: ItemCreate) -> Result<Self, LedgerError> {
        Ok(Self {
            id,
            tenant: params.tenant,
            name: validated_name(params.name)?,
            unit_price: params.unit_price,
            quantity: params.quantity,
            reorder_level: params.reorder_level,
        })
    }

    /// Catalog edit: name, price and reorder level. Quantity is untouched.
    async fn on_update(&mut self, update: ItemUpdate, _ctx: &()) -> Result<(), LedgerError> {
        self.ensure_owned_by(&update.tenant)?;
        if let Some(name) = update.name {
            self.name = validated_name(name)?;
        }
        if let Some(price) = update.unit_price {
            self.unit_price = price;
        }
        if let Some(level) = update.reorder_level {
            self.reorder_level = level;
        }
        Ok(())
    }

    async fn handle_action(
        &mut self,
        action: LedgerAction,
        _ctx: &(),
    ) -> Result<LedgerActionResult, LedgerError> {
        match action {
            LedgerAction::Inspect { tenant } => {
                self.ensure_owned_by(&tenant)?;
                Ok(LedgerActionResult::Inspected(self.snapshot()))
            }
            LedgerAction::Reserve { tenant, quantity } => {
                self.ensure_owned_by(&tenant)?;
                if quantity == 0 {
                    return Err(LedgerError::InvalidQuantity(format!(
                        "cannot reserve zero units of {}",
                        self.id
                    )));
                }
                let was_above = !self.is_below_reorder_level();
                let remaining =
                    self.quantity
                        .checked_sub(quantity)
                        .ok_or_else(|| LedgerError::InsufficientStock {
                            item: self.id,
                            name: self.name.clone(),
                            requested: quantity,
                            available: self.quantity,
                        })?;
                self.quantity = remaining;

                let below = self.is_below_reorder_level();
                if was_above && below {
                    warn!(
                        tenant = %self.tenant,
                        item = %self.id,
                        remaining,
                        reorder_level = self.reorder_level,
                        "Stock fell to reorder level"
                    );
                }
                Ok(LedgerActionResult::Reserved(Reservation {
                    item: self.id,
                    remaining,
                    below_reorder_level: below,
                }))
            }
            LedgerAction::Release { tenant, quantity } => {
                self.ensure_owned_by(&tenant)?;
                self.quantity = self.quantity.checked_add(quantity).ok_or_else(|| {
                    LedgerError::InvalidQuantity(format!(
                        "releasing {quantity} units would overflow {}",
                        self.id
                    ))
                })?;
                info!(tenant = %self.tenant, item = %self.id, quantity, remaining = self.quantity, "Stock released");
                Ok(LedgerActionResult::Released(self.quantity))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: u32, reorder_level: u32) -> InventoryItem {
        InventoryItem::from_create_params(
            ItemId(1),
            ItemCreate {
                tenant: TenantId::from("shop-a"),
                name: "  Cetirizine ".into(),
                unit_price: 300,
                quantity,
                reorder_level,
            },
        )
        .unwrap()
    }

    fn reserve(quantity: u32) -> LedgerAction {
        LedgerAction::Reserve {
            tenant: TenantId::from("shop-a"),
            quantity,
        }
    }

    #[test]
    fn create_trims_and_rejects_blank_names() {
        assert_eq!(item(1, 0).name, "Cetirizine");
        let blank = InventoryItem::from_create_params(
            ItemId(2),
            ItemCreate {
                tenant: TenantId::from("shop-a"),
                name: "   ".into(),
                unit_price: 1,
                quantity: 1,
                reorder_level: 0,
            },
        );
        assert!(matches!(blank, Err(LedgerError::InvalidItem(_))));
    }

    #[tokio::test]
    async fn reserve_decrements_and_flags_reorder_level() {
        let mut item = item(10, 3);
        match item.handle_action(reserve(7), &()).await.unwrap() {
            LedgerActionResult::Reserved(r) => {
                assert_eq!(r.remaining, 3);
                assert!(r.below_reorder_level);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(item.quantity, 3);
    }

    #[tokio::test]
    async fn reserve_never_goes_negative() {
        let mut item = item(2, 0);
        let err = item.handle_action(reserve(3), &()).await.unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientStock {
                item: ItemId(1),
                name: "Cetirizine".into(),
                requested: 3,
                available: 2,
            }
        );
        assert_eq!(item.quantity, 2);

        let zero = item.handle_action(reserve(0), &()).await.unwrap_err();
        assert!(matches!(zero, LedgerError::InvalidQuantity(_)));
    }

    #[tokio::test]
    async fn other_tenants_are_rejected() {
        let mut item = item(5, 0);
        let intruder = TenantId::from("shop-b");
        let err = item
            .handle_action(
                LedgerAction::Reserve {
                    tenant: intruder.clone(),
                    quantity: 1,
                },
                &(),
            )
            .await
            .unwrap_err();
        assert_eq!(err, LedgerError::Unauthorized(ItemId(1)));

        let mut update = ItemUpdate::new(intruder);
        update.unit_price = Some(1);
        assert!(item.on_update(update, &()).await.is_err());
        assert_eq!(item.unit_price, 300);
        assert_eq!(item.quantity, 5);
    }

    #[tokio::test]
    async fn release_restores_stock() {
        let mut item = item(5, 0);
        item.handle_action(reserve(4), &()).await.unwrap();
        let released = item
            .handle_action(
                LedgerAction::Release {
                    tenant: TenantId::from("shop-a"),
                    quantity: 4,
                },
                &(),
            )
            .await
            .unwrap();
        assert!(matches!(released, LedgerActionResult::Released(5)));
    }
}
