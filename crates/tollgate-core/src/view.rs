// ── Filter / sort engine ──
//
// Narrow and order an already-fetched collection for display: search
// term, status filter, kind filter, then a typed, stable sort. Absent
// sort values always go last, whatever the order.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use strum::{Display, EnumString};

use crate::model::{Payment, PaymentStatus, Subscription, Voucher, VoucherType};
use crate::status::{SubscriptionStatus, VoucherStatus};

// ── Selectors ───────────────────────────────────────────────────────

/// A filter value, or `all` to disable the filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selector<T> {
    #[default]
    All,
    Only(T),
}

impl<T: PartialEq> Selector<T> {
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == value,
        }
    }
}

impl<T: FromStr> FromStr for Selector<T> {
    type Err = T::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            s.trim().parse().map(Self::Only)
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Typed sort key value; compared within its own kind only.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortValue {
    Text(String),
    Number(Decimal),
    Date(DateTime<Utc>),
}

impl SortValue {
    fn text(value: &str) -> Self {
        Self::Text(value.to_lowercase())
    }
}

// ── Viewable ────────────────────────────────────────────────────────

/// An entity the engine can search, filter and sort.
pub trait Viewable {
    type Status: PartialEq;
    type Kind: PartialEq;
    type SortKey: Copy;

    /// Fields the search term is matched against.
    fn search_fields(&self) -> Vec<Option<Cow<'_, str>>>;
    fn view_status(&self, now: DateTime<Utc>) -> Self::Status;
    fn view_kind(&self) -> Self::Kind;
    fn sort_value(&self, key: Self::SortKey, now: DateTime<Utc>) -> Option<SortValue>;
}

/// Display query over a collection of `V`.
#[derive(Debug, Clone)]
pub struct ViewQuery<V: Viewable> {
    pub search: Option<String>,
    pub status: Selector<V::Status>,
    pub kind: Selector<V::Kind>,
    pub sort: Option<(V::SortKey, SortOrder)>,
}

impl<V: Viewable> Default for ViewQuery<V> {
    fn default() -> Self {
        Self {
            search: None,
            status: Selector::All,
            kind: Selector::All,
            sort: None,
        }
    }
}

impl<V: Viewable> ViewQuery<V> {
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn status(mut self, status: Selector<V::Status>) -> Self {
        self.status = status;
        self
    }

    pub fn kind(mut self, kind: Selector<V::Kind>) -> Self {
        self.kind = kind;
        self
    }

    pub fn sort(mut self, key: V::SortKey, order: SortOrder) -> Self {
        self.sort = Some((key, order));
        self
    }
}

/// Ordered subsequence of `items` matching `query`.
pub fn view<'a, V: Viewable>(
    items: &'a [V],
    query: &ViewQuery<V>,
    now: DateTime<Utc>,
) -> Vec<&'a V> {
    let needle = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    let mut rows: Vec<&V> = items
        .iter()
        .filter(|item| match &needle {
            None => true,
            Some(needle) => item
                .search_fields()
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(needle.as_str())),
        })
        .filter(|item| query.status.matches(&item.view_status(now)))
        .filter(|item| query.kind.matches(&item.view_kind()))
        .collect();

    if let Some((key, order)) = query.sort {
        let mut keyed: Vec<(Option<SortValue>, &V)> = rows
            .into_iter()
            .map(|item| (item.sort_value(key, now), item))
            .collect();
        keyed.sort_by(|(a, _), (b, _)| compare(a.as_ref(), b.as_ref(), order));
        rows = keyed.into_iter().map(|(_, item)| item).collect();
    }

    rows
}

fn compare(a: Option<&SortValue>, b: Option<&SortValue>, order: SortOrder) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => match order {
            SortOrder::Asc => a.cmp(b),
            SortOrder::Desc => b.cmp(a),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

// ── Vouchers ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum VoucherSortKey {
    Code,
    Package,
    Value,
    Status,
    UsedCount,
    CreatedAt,
    ExpiresAt,
}

impl Viewable for Voucher {
    type Status = VoucherStatus;
    type Kind = VoucherType;
    type SortKey = VoucherSortKey;

    fn search_fields(&self) -> Vec<Option<Cow<'_, str>>> {
        vec![
            Some(Cow::Borrowed(self.code.as_str())),
            Some(Cow::Borrowed(self.package_key.as_str())),
            Some(Cow::Owned(self.id.to_string())),
        ]
    }

    fn view_status(&self, now: DateTime<Utc>) -> VoucherStatus {
        self.status(now)
    }

    fn view_kind(&self) -> VoucherType {
        self.voucher_type
    }

    fn sort_value(&self, key: VoucherSortKey, now: DateTime<Utc>) -> Option<SortValue> {
        match key {
            VoucherSortKey::Code => Some(SortValue::text(&self.code)),
            VoucherSortKey::Package => Some(SortValue::text(&self.package_key)),
            VoucherSortKey::Value => Some(SortValue::Number(self.value)),
            VoucherSortKey::Status => Some(SortValue::text(&self.status(now).to_string())),
            VoucherSortKey::UsedCount => Some(SortValue::Number(Decimal::from(self.used_count))),
            VoucherSortKey::CreatedAt => Some(SortValue::Date(self.created_at)),
            VoucherSortKey::ExpiresAt => self.expires_at.map(SortValue::Date),
        }
    }
}

// ── Subscriptions ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum SubscriptionSortKey {
    User,
    Package,
    Status,
    StartAt,
    EndAt,
    CreatedAt,
}

impl Viewable for Subscription {
    type Status = SubscriptionStatus;
    /// Subscriptions are filtered by package.
    type Kind = String;
    type SortKey = SubscriptionSortKey;

    fn search_fields(&self) -> Vec<Option<Cow<'_, str>>> {
        vec![
            self.user_name().map(Cow::Borrowed),
            self.user_phone().map(Cow::Borrowed),
            Some(Cow::Borrowed(self.package_key.as_str())),
            Some(Cow::Owned(self.id.to_string())),
        ]
    }

    fn view_status(&self, now: DateTime<Utc>) -> SubscriptionStatus {
        self.status(now)
    }

    fn view_kind(&self) -> String {
        self.package_key.clone()
    }

    fn sort_value(&self, key: SubscriptionSortKey, now: DateTime<Utc>) -> Option<SortValue> {
        match key {
            SubscriptionSortKey::User => self.user_name().map(SortValue::text),
            SubscriptionSortKey::Package => Some(SortValue::text(&self.package_key)),
            SubscriptionSortKey::Status => Some(SortValue::text(&self.status(now).to_string())),
            SubscriptionSortKey::StartAt => self.start_at.map(SortValue::Date),
            SubscriptionSortKey::EndAt => self.end_at.map(SortValue::Date),
            SubscriptionSortKey::CreatedAt => Some(SortValue::Date(self.created_at)),
        }
    }
}

// ── Payments ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum PaymentSortKey {
    Amount,
    Provider,
    Status,
    TransactionId,
    CreatedAt,
}

impl Viewable for Payment {
    type Status = PaymentStatus;
    /// Payments are filtered by provider.
    type Kind = String;
    type SortKey = PaymentSortKey;

    fn search_fields(&self) -> Vec<Option<Cow<'_, str>>> {
        vec![
            self.transaction_id.as_deref().map(Cow::Borrowed),
            Some(Cow::Borrowed(self.provider.as_str())),
            self.phone.as_deref().map(Cow::Borrowed),
            Some(Cow::Owned(self.id.to_string())),
        ]
    }

    fn view_status(&self, _now: DateTime<Utc>) -> PaymentStatus {
        self.status
    }

    fn view_kind(&self) -> String {
        self.provider.clone()
    }

    fn sort_value(&self, key: PaymentSortKey, _now: DateTime<Utc>) -> Option<SortValue> {
        match key {
            PaymentSortKey::Amount => Some(SortValue::Number(self.amount_kes)),
            PaymentSortKey::Provider => Some(SortValue::text(&self.provider)),
            PaymentSortKey::Status => Some(SortValue::text(&self.status.to_string())),
            PaymentSortKey::TransactionId => self.transaction_id.as_deref().map(SortValue::text),
            PaymentSortKey::CreatedAt => Some(SortValue::Date(self.created_at)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::EntityId;
    use crate::model::subscription::tests::subscription;
    use crate::model::voucher::tests::voucher;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn codes<'a>(rows: &[&'a Voucher]) -> Vec<&'a str> {
        rows.iter().map(|v| v.code.as_str()).collect()
    }

    #[test]
    fn selector_parses_all_sentinel() {
        assert_eq!("ALL".parse::<Selector<VoucherStatus>>().unwrap(), Selector::All);
        assert_eq!(
            "used".parse::<Selector<VoucherStatus>>().unwrap(),
            Selector::Only(VoucherStatus::Used)
        );
        assert!("bogus".parse::<Selector<VoucherStatus>>().is_err());
    }

    #[test]
    fn search_by_phone_fragment() {
        let subs = vec![
            subscription("s1", "0712345678"),
            subscription("s2", "0722000111"),
            subscription("s3", "+254712999000"),
        ];
        let query = ViewQuery::default().search("0712");
        let ids: Vec<_> = view(&subs, &query, now())
            .into_iter()
            .map(|s| s.id.to_string())
            .collect();
        assert_eq!(ids, ["s1"]);
    }

    #[test]
    fn search_is_case_insensitive() {
        let vouchers = vec![voucher("PROMO_AAAAAA"), voucher("VOUCHER_BBBBBB")];
        let query = ViewQuery::default().search("promo");
        assert_eq!(codes(&view(&vouchers, &query, now())), ["PROMO_AAAAAA"]);
    }

    #[test]
    fn search_matches_uuid_id_fragment() {
        let mut minted = voucher("A_1");
        minted.id = EntityId::from("53bb5fdf-8e6e-4db8-a325-d7f127b9aa3d");
        let vouchers = vec![minted, voucher("A_2")];

        let query = ViewQuery::default().search("53BB5FDF");
        assert_eq!(codes(&view(&vouchers, &query, now())), ["A_1"]);
    }

    #[test]
    fn status_and_type_filters_combine() {
        let mut used = voucher("A_1");
        used.used = true;
        let mut bulk = voucher("A_2");
        bulk.voucher_type = VoucherType::Bulk;
        bulk.max_uses = 5;
        let single = voucher("A_3");
        let vouchers = vec![used, bulk, single];

        let query = ViewQuery::default()
            .status(Selector::Only(VoucherStatus::Active))
            .kind(Selector::Only(VoucherType::Single));
        assert_eq!(codes(&view(&vouchers, &query, now())), ["A_3"]);
    }

    #[test]
    fn absent_values_sort_last_both_ways() {
        let mut a = voucher("A");
        a.expires_at = Some(now() + Duration::days(2));
        let b = voucher("B");
        let mut c = voucher("C");
        c.expires_at = Some(now() + Duration::days(1));
        let vouchers = vec![a, b, c];

        let asc = ViewQuery::default().sort(VoucherSortKey::ExpiresAt, SortOrder::Asc);
        assert_eq!(codes(&view(&vouchers, &asc, now())), ["C", "A", "B"]);

        let desc = ViewQuery::default().sort(VoucherSortKey::ExpiresAt, SortOrder::Desc);
        assert_eq!(codes(&view(&vouchers, &desc, now())), ["A", "C", "B"]);
    }

    #[test]
    fn numbers_sort_numerically_and_stably() {
        let mut a = voucher("A");
        a.value = Decimal::new(100, 0);
        let mut b = voucher("B");
        b.value = Decimal::new(9, 0);
        let mut c = voucher("C");
        c.value = Decimal::new(100, 0);
        let vouchers = vec![a, b, c];

        let query = ViewQuery::default().sort(VoucherSortKey::Value, SortOrder::Asc);
        assert_eq!(codes(&view(&vouchers, &query, now())), ["B", "A", "C"]);
    }

    #[test]
    fn view_is_idempotent() {
        let vouchers = vec![voucher("B"), voucher("A")];
        let query = ViewQuery::default().sort(VoucherSortKey::Code, SortOrder::Asc);
        let once: Vec<Voucher> = view(&vouchers, &query, now()).into_iter().cloned().collect();
        let twice: Vec<Voucher> = view(&once, &query, now()).into_iter().cloned().collect();
        assert_eq!(once, twice);
    }

    #[test]
    fn sort_keys_parse_kebab_case() {
        assert_eq!(
            "expires-at".parse::<VoucherSortKey>().unwrap(),
            VoucherSortKey::ExpiresAt
        );
        assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::Desc);
    }
}
