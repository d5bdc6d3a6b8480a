use marketsync_core::Shipment;
use serde_json::json;

use crate::cli::{OrderStatusArgs, ShipArgs};
use crate::error::CliError;

use super::{single, CommandResult, Context};

pub async fn ship(args: &ShipArgs, context: &Context) -> Result<CommandResult, CliError> {
    let shipment = Shipment {
        carrier: args.carrier.trim().to_owned(),
        tracking_code: args.tracking_code.trim().to_owned(),
    };
    let outcome = context
        .service
        .mark_as_shipped(args.marketplace, &args.order_id, &shipment)
        .await;
    single(args.marketplace, outcome, |()| {
        Ok(json!({ "order_id": args.order_id, "status": "shipped", "shipment": shipment }))
    })
}

pub async fn status(args: &OrderStatusArgs, context: &Context) -> Result<CommandResult, CliError> {
    let outcome = context
        .service
        .update_order_status(args.marketplace, &args.order_id, &args.status)
        .await;
    single(args.marketplace, outcome, |()| {
        Ok(json!({ "order_id": args.order_id, "status": args.status }))
    })
}
