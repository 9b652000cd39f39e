//! Host part catalog: records, the transactional store port, and an in-memory store.
//!
//! Suppliers never touch host tables directly. They open a
//! [`CatalogTransaction`], perform keyed upserts, and commit; dropping a
//! transaction without committing discards every change made through it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

macro_rules! catalog_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

catalog_id!(PartId);
catalog_id!(CompanyId);
catalog_id!(ManufacturerPartId);
catalog_id!(SupplierPartId);
catalog_id!(
    /// Host part category; categories themselves are managed by the host.
    CategoryId
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub id: PartId,
    pub name: String,
    pub description: String,
    pub keywords: Option<String>,
    pub link: Option<String>,
    pub category: Option<CategoryId>,
    pub purchaseable: bool,
    pub default_supplier: Option<SupplierPartId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub is_manufacturer: bool,
    pub is_supplier: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManufacturerPart {
    pub id: ManufacturerPartId,
    pub part: PartId,
    pub manufacturer: CompanyId,
    pub mpn: String,
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierPart {
    pub id: SupplierPartId,
    pub part: PartId,
    pub manufacturer_part: ManufacturerPartId,
    pub supplier: CompanyId,
    pub sku: String,
    pub link: Option<String>,
    pub available: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBreak {
    pub supplier_part: SupplierPartId,
    pub quantity: u64,
    pub price: f64,
}

/// Fields written by a part upsert; `name` is the lookup key.
#[derive(Debug, Clone, PartialEq)]
pub struct PartFields {
    pub name: String,
    pub description: String,
    pub keywords: Option<String>,
    pub link: Option<String>,
    pub category: Option<CategoryId>,
    pub purchaseable: bool,
}

/// Flag set on a company when it is upserted. Existing flags are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompanyRole {
    Manufacturer,
    Supplier,
}

/// `(part, manufacturer, mpn)` is the lookup key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManufacturerPartFields {
    pub part: PartId,
    pub manufacturer: CompanyId,
    pub mpn: String,
    pub link: Option<String>,
}

/// `(part, manufacturer_part, supplier, sku)` is the lookup key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplierPartFields {
    pub part: PartId,
    pub manufacturer_part: ManufacturerPartId,
    pub supplier: CompanyId,
    pub sku: String,
    pub link: Option<String>,
    pub available: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBreakFields {
    pub quantity: u64,
    pub price: f64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("catalog record not found: {entity}")]
    NotFound { entity: String },
    #[error("catalog constraint violated: {message}")]
    Constraint { message: String },
    #[error("catalog store lock poisoned")]
    Poisoned,
    #[error("catalog store error: {message}")]
    Other { message: String },
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// A unit of work against the host catalog.
pub trait CatalogTransaction {
    fn upsert_part(&mut self, fields: PartFields) -> CatalogResult<PartId>;

    fn upsert_company(&mut self, name: &str, role: CompanyRole) -> CatalogResult<CompanyId>;

    fn upsert_manufacturer_part(
        &mut self,
        fields: ManufacturerPartFields,
    ) -> CatalogResult<ManufacturerPartId>;

    fn upsert_supplier_part(&mut self, fields: SupplierPartFields) -> CatalogResult<SupplierPartId>;

    /// Deletes every existing break for the supplier part, then inserts `breaks` in order.
    fn replace_price_breaks(
        &mut self,
        supplier_part: SupplierPartId,
        breaks: &[PriceBreakFields],
    ) -> CatalogResult<()>;

    fn set_default_supplier(
        &mut self,
        part: PartId,
        supplier_part: SupplierPartId,
    ) -> CatalogResult<()>;

    fn part(&self, id: PartId) -> CatalogResult<Part>;

    fn commit(self: Box<Self>) -> CatalogResult<()>;
}

/// Host catalog port.
pub trait CatalogStore: Send + Sync {
    fn begin(&self) -> CatalogResult<Box<dyn CatalogTransaction + '_>>;
}

/// Serializable contents of a [`MemoryCatalog`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(default)]
    next_id: u64,
    #[serde(default)]
    pub parts: Vec<Part>,
    #[serde(default)]
    pub companies: Vec<Company>,
    #[serde(default)]
    pub manufacturer_parts: Vec<ManufacturerPart>,
    #[serde(default)]
    pub supplier_parts: Vec<SupplierPart>,
    #[serde(default)]
    pub price_breaks: Vec<PriceBreak>,
}

impl CatalogSnapshot {
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn highest_id(&self) -> u64 {
        let parts = self.parts.iter().map(|p| p.id.0);
        let companies = self.companies.iter().map(|c| c.id.0);
        let manufacturer_parts = self.manufacturer_parts.iter().map(|mp| mp.id.0);
        let supplier_parts = self.supplier_parts.iter().map(|sp| sp.id.0);
        parts
            .chain(companies)
            .chain(manufacturer_parts)
            .chain(supplier_parts)
            .max()
            .unwrap_or(0)
    }

    pub fn part_by_name(&self, name: &str) -> Option<&Part> {
        self.parts.iter().find(|p| p.name == name)
    }

    pub fn supplier_part(&self, id: SupplierPartId) -> Option<&SupplierPart> {
        self.supplier_parts.iter().find(|sp| sp.id == id)
    }

    pub fn price_breaks_for(&self, id: SupplierPartId) -> Vec<&PriceBreak> {
        self.price_breaks
            .iter()
            .filter(|pb| pb.supplier_part == id)
            .collect()
    }

    fn require_part(&self, id: PartId) -> CatalogResult<()> {
        if self.parts.iter().any(|p| p.id == id) {
            Ok(())
        } else {
            Err(CatalogError::NotFound {
                entity: format!("part {id}"),
            })
        }
    }

    fn require_company(&self, id: CompanyId) -> CatalogResult<()> {
        if self.companies.iter().any(|c| c.id == id) {
            Ok(())
        } else {
            Err(CatalogError::NotFound {
                entity: format!("company {id}"),
            })
        }
    }
}

/// Mutex-guarded catalog used by the CLI host and tests.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    state: Mutex<CatalogSnapshot>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads saved contents. The id counter never restarts below an id
    /// already present, whatever `next_id` the snapshot carried.
    pub fn from_snapshot(mut snapshot: CatalogSnapshot) -> Self {
        snapshot.next_id = snapshot.next_id.max(snapshot.highest_id());
        Self {
            state: Mutex::new(snapshot),
        }
    }

    /// Copy of the committed state.
    pub fn snapshot(&self) -> CatalogResult<CatalogSnapshot> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> CatalogResult<MutexGuard<'_, CatalogSnapshot>> {
        self.state.lock().map_err(|_| CatalogError::Poisoned)
    }
}

impl CatalogStore for MemoryCatalog {
    fn begin(&self) -> CatalogResult<Box<dyn CatalogTransaction + '_>> {
        let guard = self.lock()?;
        let working = guard.clone();
        Ok(Box::new(MemoryTransaction { guard, working }))
    }
}

/// Holds the store lock for its lifetime and edits a private copy.
struct MemoryTransaction<'a> {
    guard: MutexGuard<'a, CatalogSnapshot>,
    working: CatalogSnapshot,
}

impl CatalogTransaction for MemoryTransaction<'_> {
    fn upsert_part(&mut self, fields: PartFields) -> CatalogResult<PartId> {
        let state = &mut self.working;
        if let Some(part) = state.parts.iter_mut().find(|p| p.name == fields.name) {
            part.description = fields.description;
            part.keywords = fields.keywords;
            part.link = fields.link;
            part.category = fields.category;
            part.purchaseable = fields.purchaseable;
            return Ok(part.id);
        }
        let id = PartId(state.allocate());
        state.parts.push(Part {
            id,
            name: fields.name,
            description: fields.description,
            keywords: fields.keywords,
            link: fields.link,
            category: fields.category,
            purchaseable: fields.purchaseable,
            default_supplier: None,
        });
        Ok(id)
    }

    fn upsert_company(&mut self, name: &str, role: CompanyRole) -> CatalogResult<CompanyId> {
        let state = &mut self.working;
        let company = match state.companies.iter().position(|c| c.name == name) {
            Some(index) => &mut state.companies[index],
            None => {
                let id = CompanyId(state.allocate());
                state.companies.push(Company {
                    id,
                    name: name.to_string(),
                    is_manufacturer: false,
                    is_supplier: false,
                });
                state.companies.last_mut().ok_or(CatalogError::Other {
                    message: "company insert lost".into(),
                })?
            }
        };
        match role {
            CompanyRole::Manufacturer => company.is_manufacturer = true,
            CompanyRole::Supplier => company.is_supplier = true,
        }
        Ok(company.id)
    }

    fn upsert_manufacturer_part(
        &mut self,
        fields: ManufacturerPartFields,
    ) -> CatalogResult<ManufacturerPartId> {
        let state = &mut self.working;
        state.require_part(fields.part)?;
        state.require_company(fields.manufacturer)?;
        if let Some(existing) = state.manufacturer_parts.iter_mut().find(|mp| {
            mp.part == fields.part && mp.manufacturer == fields.manufacturer && mp.mpn == fields.mpn
        }) {
            existing.link = fields.link;
            return Ok(existing.id);
        }
        let id = ManufacturerPartId(state.allocate());
        state.manufacturer_parts.push(ManufacturerPart {
            id,
            part: fields.part,
            manufacturer: fields.manufacturer,
            mpn: fields.mpn,
            link: fields.link,
        });
        Ok(id)
    }

    fn upsert_supplier_part(&mut self, fields: SupplierPartFields) -> CatalogResult<SupplierPartId> {
        let state = &mut self.working;
        state.require_part(fields.part)?;
        state.require_company(fields.supplier)?;
        let manufacturer_part = state
            .manufacturer_parts
            .iter()
            .find(|mp| mp.id == fields.manufacturer_part)
            .ok_or_else(|| CatalogError::NotFound {
                entity: format!("manufacturer part {}", fields.manufacturer_part),
            })?;
        if manufacturer_part.part != fields.part {
            return Err(CatalogError::Constraint {
                message: format!(
                    "manufacturer part {} does not belong to part {}",
                    fields.manufacturer_part, fields.part
                ),
            });
        }
        if let Some(existing) = state.supplier_parts.iter_mut().find(|sp| {
            sp.part == fields.part
                && sp.manufacturer_part == fields.manufacturer_part
                && sp.supplier == fields.supplier
                && sp.sku == fields.sku
        }) {
            existing.link = fields.link;
            existing.available = fields.available;
            return Ok(existing.id);
        }
        let id = SupplierPartId(state.allocate());
        state.supplier_parts.push(SupplierPart {
            id,
            part: fields.part,
            manufacturer_part: fields.manufacturer_part,
            supplier: fields.supplier,
            sku: fields.sku,
            link: fields.link,
            available: fields.available,
        });
        Ok(id)
    }

    fn replace_price_breaks(
        &mut self,
        supplier_part: SupplierPartId,
        breaks: &[PriceBreakFields],
    ) -> CatalogResult<()> {
        let state = &mut self.working;
        if state.supplier_part(supplier_part).is_none() {
            return Err(CatalogError::NotFound {
                entity: format!("supplier part {supplier_part}"),
            });
        }
        state.price_breaks.retain(|pb| pb.supplier_part != supplier_part);
        state
            .price_breaks
            .extend(breaks.iter().map(|b| PriceBreak {
                supplier_part,
                quantity: b.quantity,
                price: b.price,
            }));
        Ok(())
    }

    fn set_default_supplier(
        &mut self,
        part: PartId,
        supplier_part: SupplierPartId,
    ) -> CatalogResult<()> {
        let state = &mut self.working;
        let owner = state
            .supplier_part(supplier_part)
            .map(|sp| sp.part)
            .ok_or_else(|| CatalogError::NotFound {
                entity: format!("supplier part {supplier_part}"),
            })?;
        if owner != part {
            return Err(CatalogError::Constraint {
                message: format!("supplier part {supplier_part} does not belong to part {part}"),
            });
        }
        let record = state
            .parts
            .iter_mut()
            .find(|p| p.id == part)
            .ok_or_else(|| CatalogError::NotFound {
                entity: format!("part {part}"),
            })?;
        record.default_supplier = Some(supplier_part);
        Ok(())
    }

    fn part(&self, id: PartId) -> CatalogResult<Part> {
        self.working
            .parts
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound {
                entity: format!("part {id}"),
            })
    }

    fn commit(self: Box<Self>) -> CatalogResult<()> {
        let MemoryTransaction { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resistor() -> PartFields {
        PartFields {
            name: "10k Resistor".into(),
            description: "RES 10K OHM 1% 1/10W 0603".into(),
            keywords: Some("Resistors".into()),
            link: None,
            category: Some(CategoryId(3)),
            purchaseable: true,
        }
    }

    #[test]
    fn uncommitted_transaction_is_discarded() {
        let catalog = MemoryCatalog::new();
        {
            let mut tx = catalog.begin().unwrap();
            tx.upsert_part(resistor()).unwrap();
        }
        assert!(catalog.snapshot().unwrap().parts.is_empty());
    }

    #[test]
    fn part_upsert_updates_in_place() {
        let catalog = MemoryCatalog::new();
        let mut tx = catalog.begin().unwrap();
        let first = tx.upsert_part(resistor()).unwrap();
        let mut changed = resistor();
        changed.description = "updated".into();
        let second = tx.upsert_part(changed).unwrap();
        tx.commit().unwrap();

        assert_eq!(first, second);
        let snapshot = catalog.snapshot().unwrap();
        assert_eq!(snapshot.parts.len(), 1);
        assert_eq!(snapshot.parts[0].description, "updated");
    }

    #[test]
    fn company_roles_accumulate() {
        let catalog = MemoryCatalog::new();
        let mut tx = catalog.begin().unwrap();
        let a = tx.upsert_company("Acme", CompanyRole::Manufacturer).unwrap();
        let b = tx.upsert_company("Acme", CompanyRole::Supplier).unwrap();
        tx.commit().unwrap();

        assert_eq!(a, b);
        let company = &catalog.snapshot().unwrap().companies[0];
        assert!(company.is_manufacturer && company.is_supplier);
    }

    #[test]
    fn price_breaks_are_replaced() {
        let catalog = MemoryCatalog::new();
        let mut tx = catalog.begin().unwrap();
        let part = tx.upsert_part(resistor()).unwrap();
        let maker = tx.upsert_company("Acme", CompanyRole::Manufacturer).unwrap();
        let vendor = tx.upsert_company("Digikey", CompanyRole::Supplier).unwrap();
        let mp = tx
            .upsert_manufacturer_part(ManufacturerPartFields {
                part,
                manufacturer: maker,
                mpn: "ACM-1".into(),
                link: None,
            })
            .unwrap();
        let sp = tx
            .upsert_supplier_part(SupplierPartFields {
                part,
                manufacturer_part: mp,
                supplier: vendor,
                sku: "DK-1".into(),
                link: None,
                available: 10,
            })
            .unwrap();
        tx.replace_price_breaks(
            sp,
            &[
                PriceBreakFields { quantity: 1, price: 0.2 },
                PriceBreakFields { quantity: 10, price: 0.15 },
            ],
        )
        .unwrap();
        tx.replace_price_breaks(sp, &[PriceBreakFields { quantity: 5, price: 0.1 }])
            .unwrap();
        tx.set_default_supplier(part, sp).unwrap();
        tx.commit().unwrap();

        let snapshot = catalog.snapshot().unwrap();
        let breaks = snapshot.price_breaks_for(sp);
        assert_eq!(breaks.len(), 1);
        assert_eq!(breaks[0].quantity, 5);
        assert_eq!(snapshot.parts[0].default_supplier, Some(sp));
    }

    #[test]
    fn default_supplier_must_belong_to_part() {
        let catalog = MemoryCatalog::new();
        let mut tx = catalog.begin().unwrap();
        let part = tx.upsert_part(resistor()).unwrap();
        let result = tx.set_default_supplier(part, SupplierPartId(99));
        assert!(matches!(result, Err(CatalogError::NotFound { .. })));
    }

    #[test]
    fn snapshot_survives_json() {
        let catalog = MemoryCatalog::new();
        let mut tx = catalog.begin().unwrap();
        tx.upsert_part(resistor()).unwrap();
        tx.commit().unwrap();

        let json = serde_json::to_string(&catalog.snapshot().unwrap()).unwrap();
        let restored = MemoryCatalog::from_snapshot(serde_json::from_str(&json).unwrap());
        let mut tx = restored.begin().unwrap();
        let id = tx.upsert_part(resistor()).unwrap();
        assert_eq!(tx.part(id).unwrap().name, "10k Resistor");
        assert_eq!(id, PartId(1));
    }

    #[test]
    fn loaded_catalog_without_counter_allocates_fresh_ids() {
        let snapshot: CatalogSnapshot = serde_json::from_str(
            r#"{
                "parts": [{
                    "id": 1, "name": "A", "description": "a", "keywords": null,
                    "link": null, "category": null, "purchaseable": true,
                    "default_supplier": null
                }],
                "companies": [{
                    "id": 7, "name": "Acme", "is_manufacturer": true, "is_supplier": false
                }]
            }"#,
        )
        .unwrap();
        let catalog = MemoryCatalog::from_snapshot(snapshot);

        let mut tx = catalog.begin().unwrap();
        let mut other = resistor();
        other.name = "B".into();
        let id = tx.upsert_part(other).unwrap();
        tx.commit().unwrap();

        assert_eq!(id, PartId(8));
        let ids: Vec<_> = catalog.snapshot().unwrap().parts.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![PartId(1), PartId(8)]);
    }
}
