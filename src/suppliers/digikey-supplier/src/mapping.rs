use crate::models::ProductDetails;
use crate::DigikeyPlugin;
use partlink_core::catalog::{
    CategoryId, CompanyRole, ManufacturerPartFields, Part, PartFields, PriceBreakFields,
    SupplierPartFields,
};
use partlink_core::notify::{Notification, UserId};
use partlink_core::{SupplierError, SupplierResult};
use serde_json::Value;

/// Company name the supplier side of every imported part is filed under.
pub const SUPPLIER_COMPANY: &str = "Digikey";

/// Notification event raised after a successful import.
pub const IMPORT_EVENT: &str = "supplier.import";

/// Name of the manufacturer company for a product.
///
/// Part-detail payloads have been filed by their `Supplier` field since the
/// first import; switching to the `Manufacturer` object changes which
/// companies existing parts resolve to, so the choice lives here alone.
pub fn manufacturer_name(details: &ProductDetails) -> &str {
    &details.supplier
}

pub fn parse_product(payload: &Value) -> SupplierResult<ProductDetails> {
    let details: ProductDetails =
        serde_json::from_value(payload.clone()).map_err(|e| SupplierError::Validation {
            message: format!("incomplete part payload: {e}"),
        })?;
    let required = [
        ("ProductDescription", &details.product_description),
        ("Supplier", &details.supplier),
        ("ManufacturerPartNumber", &details.manufacturer_part_number),
        ("DigiKeyPartNumber", &details.digi_key_part_number),
    ];
    if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
        return Err(SupplierError::Validation {
            message: format!("incomplete part payload: {field} is empty"),
        });
    }
    Ok(details)
}

fn part_fields(details: &ProductDetails, category: Option<CategoryId>) -> PartFields {
    PartFields {
        name: details.product_description.clone(),
        description: details
            .detailed_description
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| details.product_description.clone()),
        keywords: details
            .limited_taxonomy
            .as_ref()
            .and_then(|taxonomy| taxonomy.value.clone()),
        link: details.product_url.clone(),
        category,
        purchaseable: true,
    }
}

fn price_breaks(details: &ProductDetails) -> Vec<PriceBreakFields> {
    details
        .standard_pricing
        .iter()
        .map(|tier| PriceBreakFields {
            quantity: tier.break_quantity,
            price: tier.unit_price,
        })
        .collect()
}

impl DigikeyPlugin {
    /// Upserts a part-detail payload into the catalog as one transaction and
    /// notifies `user` once it is committed.
    pub fn import_part(
        &self,
        payload: &Value,
        category: Option<CategoryId>,
        user: &UserId,
    ) -> SupplierResult<Part> {
        let details = parse_product(payload)?;
        let link = details.product_url.clone();

        let mut tx = self.catalog.begin()?;
        let part = tx.upsert_part(part_fields(&details, category))?;
        let manufacturer =
            tx.upsert_company(manufacturer_name(&details), CompanyRole::Manufacturer)?;
        let manufacturer_part = tx.upsert_manufacturer_part(ManufacturerPartFields {
            part,
            manufacturer,
            mpn: details.manufacturer_part_number.clone(),
            link: link.clone(),
        })?;
        let supplier = tx.upsert_company(SUPPLIER_COMPANY, CompanyRole::Supplier)?;
        let supplier_part = tx.upsert_supplier_part(SupplierPartFields {
            part,
            manufacturer_part,
            supplier,
            sku: details.digi_key_part_number.clone(),
            link,
            available: details.quantity_available,
        })?;
        tx.replace_price_breaks(supplier_part, &price_breaks(&details))?;
        tx.set_default_supplier(part, supplier_part)?;
        let imported = tx.part(part)?;
        tx.commit()?;

        tracing::info!(
            part = %imported.name,
            sku = %details.digi_key_part_number,
            breaks = details.standard_pricing.len(),
            "imported digikey part"
        );
        self.notifier.trigger(
            IMPORT_EVENT,
            user,
            &Notification {
                title: "Part imported from Digikey".into(),
                message: format!(
                    "{} ({}) was imported from Digikey",
                    imported.name, details.digi_key_part_number
                ),
            },
        );
        Ok(imported)
    }
}
