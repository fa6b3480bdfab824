//! Wire shape of the product snapshot consumed by the report.
//!
//! The snapshot is the body of the inventory application's product listing
//! endpoint: `{ "data": [ product, ... ] }`, each product carrying its
//! incoming (`BarangMasuk`) and outgoing (`BarangKeluar`) rows. The
//! single-product endpoint returns `{ "data": product }`; both are accepted.
//!
//! Quantities and prices are kept as raw JSON numbers here so that a
//! fractional or oversized value fails only its own product during
//! conversion, not the whole snapshot.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

use stockflow_core::{DomainError, DomainResult, Entity, LotId, ProductId, TransactionId};
use stockflow_inventory::{IncomingLot, OutgoingTransaction};

use crate::product::Product;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    #[serde(default, deserialize_with = "one_or_many")]
    pub data: Vec<ProductRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    pub nama_produk: String,
    #[serde(default)]
    pub kategori: String,
    #[serde(default = "zero")]
    pub harga: Number,
    /// Stock counter maintained by the source application.
    #[serde(default)]
    pub stok: Option<Number>,
    #[serde(rename = "BarangMasuk", default)]
    pub barang_masuk: Vec<IncomingRecord>,
    #[serde(rename = "BarangKeluar", default)]
    pub barang_keluar: Vec<OutgoingRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingRecord {
    pub id: i64,
    pub tanggal_masuk: String,
    pub jumlah: Number,
    #[serde(default)]
    pub tanggal_kadaluarsa: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutgoingRecord {
    pub id: i64,
    pub tanggal_keluar: String,
    pub jumlah: Number,
}

impl Entity for ProductRecord {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn zero() -> Number {
    Number::from(0)
}

/// Accept `data` as a list of products or as a single product. Errors name
/// the offending list position.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<ProductRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                serde_json::from_value(item)
                    .map_err(|err| D::Error::custom(format!("data[{index}]: {err}")))
            })
            .collect(),
        single => serde_json::from_value(single)
            .map(|record| vec![record])
            .map_err(|err| D::Error::custom(format!("data: {err}"))),
    }
}

impl ProductRecord {
    /// Convert wire rows into domain records, parsing every timestamp.
    pub fn into_product(self) -> DomainResult<Product> {
        let incoming = self
            .barang_masuk
            .iter()
            .map(IncomingRecord::to_lot)
            .collect::<DomainResult<Vec<_>>>()?;
        let outgoing = self
            .barang_keluar
            .iter()
            .map(OutgoingRecord::to_transaction)
            .collect::<DomainResult<Vec<_>>>()?;

        let owner = format!("product {}", self.id);
        let price = whole_number(&self.harga, "harga", &owner)?;
        let recorded_stock = self
            .stok
            .as_ref()
            .map(|stok| whole_number(stok, "stok", &owner))
            .transpose()?;

        Ok(Product {
            id: self.id,
            name: self.nama_produk,
            category: self.kategori,
            price,
            recorded_stock,
            incoming,
            outgoing,
        })
    }
}

impl IncomingRecord {
    pub fn to_lot(&self) -> DomainResult<IncomingLot> {
        let owner = format!("incoming lot {}", self.id);
        let received_at = parse_timestamp(&self.tanggal_masuk, "tanggal_masuk", &owner)?;
        let expires_at = self
            .tanggal_kadaluarsa
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| parse_timestamp(raw, "tanggal_kadaluarsa", &owner))
            .transpose()?;

        let quantity = whole_number(&self.jumlah, "jumlah", &owner)?;

        Ok(IncomingLot {
            id: LotId::new(self.id),
            quantity,
            received_at,
            expires_at,
        })
    }
}

impl OutgoingRecord {
    pub fn to_transaction(&self) -> DomainResult<OutgoingTransaction> {
        let owner = format!("outgoing transaction {}", self.id);
        let occurred_at = parse_timestamp(&self.tanggal_keluar, "tanggal_keluar", &owner)?;
        let quantity = whole_number(&self.jumlah, "jumlah", &owner)?;
        Ok(OutgoingTransaction::new(
            TransactionId::new(self.id),
            quantity,
            occurred_at,
        ))
    }
}

/// Read a JSON number as a whole `i64`. `5.0` is accepted; `2.5` and values
/// outside the `i64` range are `InvalidInput`.
pub fn whole_number(value: &Number, field: &str, owner: &str) -> DomainResult<i64> {
    if let Some(n) = value.as_i64() {
        return Ok(n);
    }
    // u64 above i64::MAX and every float land here.
    let float = value.as_f64().unwrap_or(f64::NAN);
    if float.fract() != 0.0 && float.is_finite() {
        return Err(DomainError::invalid_input(format!(
            "{owner}: non-integer {field} {value}"
        )));
    }
    // i64::MIN is exactly representable; i64::MAX rounds up to 2^63.
    if !(i64::MIN as f64..i64::MAX as f64).contains(&float) {
        return Err(DomainError::invalid_input(format!(
            "{owner}: {field} {value} is out of range"
        )));
    }
    Ok(float as i64)
}

/// Parse an RFC 3339 timestamp, a zone-less `YYYY-MM-DDTHH:MM:SS` /
/// `YYYY-MM-DD HH:MM:SS` (taken as UTC), or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_timestamp(raw: &str, field: &str, owner: &str) -> DomainResult<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Some(midnight) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight.and_utc());
    }

    Err(DomainError::invalid_input(format!(
        "{owner}: unparseable {field} '{raw}'"
    )))
}
