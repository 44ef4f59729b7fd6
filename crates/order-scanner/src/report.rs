//! Scan reports
//!
//! A [`ScanReport`] holds one [`TokenReport`] per tracked token. It renders as
//! plain text through `Display` and as JSON through serde.

use chrono::{DateTime, Utc};
use limit_order_core::layout::{
    BORROW_MAKING_AMOUNT, CURRENT_MAKING_AMOUNT, CURRENT_TAKING_AMOUNT, ORIGINAL_MAKING_AMOUNT,
    ORIGINAL_TAKING_AMOUNT,
};
use limit_order_core::{
    field_spans, ClassifiedOrder, DisplayAmount, FieldKind, FieldLayout, FieldSpan, OrderSide,
    OrderStatus, Pubkey, TokenRegistry, ADDRESS_LEN, EXPIRY_TAG_OFFSET, INPUT_MINT_OFFSET,
    OUTPUT_MINT_OFFSET,
};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

use crate::config::TrackedToken;
use crate::error::{ScannerError, ScannerResult};
use crate::processor::{BatchOutcome, RejectedAccount};
use crate::source::RawAccount;

const RULE: &str = "==========================================";

/// One field of an order account, as stored and as decoded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DumpedField {
    pub name: &'static str,
    pub kind: &'static str,
    pub offset: usize,
    pub width: usize,
    pub hex: String,
    pub value: String,
    /// Amount fields scaled by the decimals of the mint they are counted in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decimal: Option<String>,
    /// UTC rendering of timestamp fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utc: Option<String>,
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// `2024-11-22 22:03:20 UTC`, or `None` for out-of-range timestamps
pub fn format_utc(timestamp: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
}

fn read_le<const N: usize>(slice: &[u8]) -> Option<[u8; N]> {
    slice.get(..N)?.try_into().ok()
}

fn field_value(kind: FieldKind, slice: &[u8]) -> Option<(String, Option<String>)> {
    let value = match kind {
        FieldKind::Address => (Pubkey::new_from_array(read_le(slice)?).to_string(), None),
        FieldKind::U64 => (u64::from_le_bytes(read_le(slice)?).to_string(), None),
        FieldKind::U16 => (u16::from_le_bytes(read_le(slice)?).to_string(), None),
        FieldKind::U8 => (slice.first()?.to_string(), None),
        FieldKind::I64 => {
            let ts = i64::from_le_bytes(read_le(slice)?);
            (ts.to_string(), format_utc(ts))
        }
        FieldKind::OptionI64 => match slice.split_first()? {
            (&0, _) => ("None".to_string(), None),
            (_, rest) => {
                let ts = i64::from_le_bytes(read_le(rest)?);
                (format!("Some({})", ts), format_utc(ts))
            }
        },
    };
    Some(value)
}

fn mint_at(data: &[u8], offset: usize) -> Option<Pubkey> {
    let bytes = data.get(offset..offset + ADDRESS_LEN)?;
    Some(Pubkey::new_from_array(read_le(bytes)?))
}

/// Making amounts count the input token, taking amounts the output token
fn amount_mint(field: &FieldLayout, input: Option<Pubkey>, output: Option<Pubkey>) -> Option<Pubkey> {
    if [ORIGINAL_MAKING_AMOUNT, CURRENT_MAKING_AMOUNT, BORROW_MAKING_AMOUNT].contains(field) {
        input
    } else if [ORIGINAL_TAKING_AMOUNT, CURRENT_TAKING_AMOUNT].contains(field) {
        output
    } else {
        None
    }
}

/// Per-field dump of the raw order account at `address`, laid out by its
/// `expired_at` tag. Amount fields also carry a decimal value using the
/// decimals `registry` reports for their mint.
pub fn field_dump(
    address: &Pubkey,
    data: &[u8],
    registry: &dyn TokenRegistry,
) -> ScannerResult<Vec<DumpedField>> {
    let tag = data.get(EXPIRY_TAG_OFFSET).copied().unwrap_or_default();
    let spans = field_spans(tag).map_err(|e| ScannerError::InvalidAccountData {
        address: address.to_string(),
        reason: e.to_string(),
    })?;
    let input_mint = mint_at(data, INPUT_MINT_OFFSET);
    let output_mint = mint_at(data, OUTPUT_MINT_OFFSET);

    Ok(spans
        .iter()
        .filter_map(|span: &FieldSpan| {
            let slice = span.slice(data)?;
            let (value, utc) = field_value(span.field.kind, slice)?;
            let decimal = amount_mint(&span.field, input_mint, output_mint).and_then(|mint| {
                let raw = u64::from_le_bytes(read_le(slice)?);
                Some(DisplayAmount::resolve(raw, &mint, registry).to_string())
            });
            Some(DumpedField {
                name: span.field.name,
                kind: span.field.kind.name(),
                offset: span.offset,
                width: span.width,
                hex: to_hex(slice),
                value,
                decimal,
                utc,
            })
        })
        .collect())
}

/// A classified order seen from one tracked token
#[derive(Debug, Clone, Serialize)]
pub struct ReportedOrder {
    pub side: OrderSide,
    #[serde(flatten)]
    pub order: ClassifiedOrder,
    /// Remaining input amount in display units
    pub remaining: DisplayAmount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_symbol: Option<String>,
    pub original_making: DisplayAmount,
    pub original_taking: DisplayAmount,
    pub current_taking: DisplayAmount,
    /// Output tokens asked per input token, from the original amounts
    pub limit_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<DumpedField>>,
}

impl ReportedOrder {
    pub fn new(side: OrderSide, order: ClassifiedOrder, registry: &dyn TokenRegistry) -> Self {
        let record = &order.record;
        let input = &record.input_mint;
        let output = &record.output_mint;
        let original_making = DisplayAmount::resolve(record.original_making_amount, input, registry);
        let original_taking = DisplayAmount::resolve(record.original_taking_amount, output, registry);
        let current_taking = DisplayAmount::resolve(record.current_taking_amount, output, registry);
        let price_symbol = registry
            .symbol(output)
            .zip(registry.symbol(input))
            .map(|(out, inp)| format!("{}/{}", out, inp));

        Self {
            side,
            remaining: order.remaining_display(registry),
            remaining_symbol: registry.symbol(input),
            limit_price: limit_price(&original_making, &original_taking),
            original_making,
            original_taking,
            current_taking,
            price_symbol,
            fields: None,
            order,
        }
    }
}

/// Normalized taking over normalized making, `None` when nothing was offered
pub fn limit_price(making: &DisplayAmount, taking: &DisplayAmount) -> Option<Decimal> {
    if making.raw == 0 {
        return None;
    }
    taking.value?.checked_div(making.value?)
}

/// Counts for one tracked token
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TokenSummary {
    pub symbol: String,
    #[serde(with = "limit_order_core::order::pubkey_serde")]
    pub mint: Pubkey,
    pub total_orders: usize,
    pub sell_orders: usize,
    pub buy_orders: usize,
    pub active: usize,
    pub active_partial: usize,
    pub expired_partial: usize,
    pub rejected: usize,
    pub invariant_violations: usize,
}

impl TokenSummary {
    pub fn count(&self, status: OrderStatus) -> usize {
        match status {
            OrderStatus::Active => self.active,
            OrderStatus::ActivePartial => self.active_partial,
            OrderStatus::ExpiredPartial => self.expired_partial,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenReport {
    pub summary: TokenSummary,
    pub orders: Vec<ReportedOrder>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<RejectedAccount>,
}

impl TokenReport {
    /// Summarize `outcome` for `token`. With `detailed`, each order carries a
    /// field dump of its bytes from `accounts`.
    pub fn build(
        token: &TrackedToken,
        outcome: BatchOutcome,
        accounts: &[RawAccount],
        registry: &dyn TokenRegistry,
        detailed: bool,
    ) -> Self {
        let raw_by_address: HashMap<Pubkey, &[u8]> = accounts
            .iter()
            .map(|a| (a.address, a.data.as_slice()))
            .collect();

        let mut summary = TokenSummary {
            symbol: token.symbol.clone(),
            mint: token.mint,
            rejected: outcome.rejected.len(),
            ..TokenSummary::default()
        };

        let mut orders = Vec::with_capacity(outcome.orders.len());
        for order in outcome.orders {
            let Some(side) = order.record.side_for(&token.mint) else {
                warn!(
                    order = %order.record.order_address,
                    "Order does not involve {}, skipping", token.symbol
                );
                continue;
            };

            summary.total_orders += 1;
            match side {
                OrderSide::Sell => summary.sell_orders += 1,
                OrderSide::Buy => summary.buy_orders += 1,
            }
            match order.status {
                OrderStatus::Active => summary.active += 1,
                OrderStatus::ActivePartial => summary.active_partial += 1,
                OrderStatus::ExpiredPartial => summary.expired_partial += 1,
            }
            if order.has_diagnostics() {
                summary.invariant_violations += 1;
            }

            let address = order.record.order_address;
            let mut reported = ReportedOrder::new(side, order, registry);
            if detailed {
                reported.fields = raw_by_address
                    .get(&address)
                    .and_then(|data| field_dump(&address, data, registry).ok());
            }
            orders.push(reported);
        }

        // Sells before buys, then by address for stable output
        orders.sort_by(|a, b| {
            (a.side == OrderSide::Buy, a.order.record.order_address.to_string())
                .cmp(&(b.side == OrderSide::Buy, b.order.record.order_address.to_string()))
        });

        Self {
            summary,
            orders,
            rejected: outcome.rejected,
        }
    }

    pub fn partially_filled(&self) -> impl Iterator<Item = &ReportedOrder> {
        self.orders.iter().filter(|o| o.order.is_partially_filled)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub generated_at: DateTime<Utc>,
    /// Clock the orders were classified against
    pub now: i64,
    #[serde(with = "limit_order_core::order::pubkey_serde")]
    pub program_id: Pubkey,
    pub tokens: Vec<TokenReport>,
}

impl ScanReport {
    pub fn new(program_id: Pubkey, now: i64, tokens: Vec<TokenReport>) -> Self {
        Self {
            generated_at: Utc::now(),
            now,
            program_id,
            tokens,
        }
    }

    pub fn total_orders(&self) -> usize {
        self.tokens.iter().map(|t| t.summary.total_orders).sum()
    }

    pub fn total_rejected(&self) -> usize {
        self.tokens.iter().map(|t| t.summary.rejected).sum()
    }

    pub fn token(&self, symbol: &str) -> Option<&TokenReport> {
        self.tokens.iter().find(|t| t.summary.symbol == symbol)
    }

    pub fn to_json(&self) -> ScannerResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn render_text(&self) -> String {
        self.to_string()
    }
}

fn percent(value: Decimal) -> String {
    format!("{:.2}%", value)
}

impl fmt::Display for ReportedOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = &self.order.record;
        write!(
            f,
            "{} {} {} filled, remaining {}",
            record.order_address,
            self.side,
            percent(self.order.percent_filled),
            self.remaining
        )?;
        if let Some(symbol) = &self.remaining_symbol {
            write!(f, " {}", symbol)?;
        }
        write!(f, " [{}]", self.order.status)?;
        if let Some(expiry) = record.expiry.and_then(format_utc) {
            write!(f, " expires {}", expiry)?;
        }
        if let Some(price) = self.limit_price {
            write!(f, " price {}", price.normalize())?;
            if let Some(symbol) = &self.price_symbol {
                write!(f, " {}", symbol)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for ScanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", RULE)?;
        writeln!(f, "           ORDER SUMMARY")?;
        writeln!(f, "{}", RULE)?;
        for token in &self.tokens {
            let s = &token.summary;
            writeln!(f, "{}:", s.symbol)?;
            writeln!(f, "  Sell Orders: {}", s.sell_orders)?;
            writeln!(f, "  Buy Orders: {}", s.buy_orders)?;
            writeln!(f, "  Total Orders: {}", s.total_orders)?;
            for status in OrderStatus::ALL {
                writeln!(f, "    {}: {}", status, s.count(status))?;
            }
            if s.rejected > 0 {
                writeln!(f, "  Rejected Accounts: {}", s.rejected)?;
            }
            if s.invariant_violations > 0 {
                writeln!(f, "  Invariant Violations: {}", s.invariant_violations)?;
            }

            let mut partial = token.partially_filled().peekable();
            if partial.peek().is_some() {
                writeln!(f, "  Partially Filled:")?;
                for order in partial {
                    writeln!(f, "    {}", order)?;
                }
            }
            writeln!(f)?;
        }
        writeln!(f, "TOTAL ORDERS: {}", self.total_orders())?;
        writeln!(f, "{}", RULE)?;

        for token in &self.tokens {
            for rejected in &token.rejected {
                writeln!(f, "Rejected {}: {}", rejected.address, rejected.error)?;
            }
        }

        let detailed: Vec<_> = self
            .tokens
            .iter()
            .flat_map(|t| t.orders.iter().map(move |o| (&t.summary.symbol, o)))
            .filter(|(_, o)| o.fields.is_some())
            .collect();
        if detailed.is_empty() {
            return Ok(());
        }

        writeln!(f)?;
        writeln!(f, "{}", RULE)?;
        writeln!(f, "           DETAILED ORDER DATA")?;
        writeln!(f, "{}", RULE)?;
        for (index, (symbol, order)) in detailed.iter().enumerate() {
            writeln!(f)?;
            writeln!(f, "Order #{} ({}):", index + 1, symbol)?;
            writeln!(f, "Account: {}", order.order.record.order_address)?;
            writeln!(f, "Type: {}", order.side)?;
            writeln!(f, "Status: {}", order.order.status)?;
            if let Some(price) = order.limit_price {
                writeln!(f, "Limit Price: {}", price.normalize())?;
            }
            for diagnostic in &order.order.diagnostics {
                writeln!(f, "Warning: {}", diagnostic)?;
            }
            for field in order.fields.iter().flatten() {
                writeln!(
                    f,
                    "  {} ({}, {}..{}): {}",
                    field.name,
                    field.kind,
                    field.offset,
                    field.offset + field.width,
                    field.value
                )?;
                writeln!(f, "    hex: {}", field.hex)?;
                if let Some(decimal) = &field.decimal {
                    writeln!(f, "    decimal value: {}", decimal)?;
                }
                if let Some(utc) = &field.utc {
                    writeln!(f, "    date: {}", utc)?;
                }
            }
            writeln!(f, "----------------------------------------")?;
        }
        Ok(())
    }
}
