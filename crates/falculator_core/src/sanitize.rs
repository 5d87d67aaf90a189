//! Config normalization.
//!
//! Sanitize is an idempotent pass run on load, on save, at simulation
//! start, and on explicit request. It assigns ids, migrates legacy
//! fields, enforces the cross-item invariants (single main savings,
//! unique eval order, resolvable event targets, known tags), and
//! collects everything it changed into a [`SanitizeReport`] the caller
//! can show as a diff. Corrections are non-fatal; the report also
//! carries the few conditions that must refuse simulation outright.

use jiff::civil::Date;
use rust_decimal::Decimal;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::Config;
use crate::date_math::add_years;
use crate::error::SanitizeError;
use crate::model::{FinancialItem, ItemId, ItemType};

/// One auto-applied correction, attributed to the entity it touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correction {
    pub entity: ItemId,
    pub message: String,
}

/// Everything a sanitize run changed or refused.
#[derive(Debug, Clone, Default)]
pub struct SanitizeReport {
    corrections: Vec<Correction>,
    fatals: Vec<SanitizeError>,
}

impl SanitizeReport {
    pub fn correct(&mut self, entity: ItemId, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(id = %entity, "sanitize: {message}");
        self.corrections.push(Correction { entity, message });
    }

    pub fn fatal(&mut self, error: SanitizeError) {
        tracing::error!("sanitize: {error}");
        self.fatals.push(error);
    }

    pub fn corrections(&self) -> &[Correction] {
        &self.corrections
    }

    pub fn fatals(&self) -> &[SanitizeError] {
        &self.fatals
    }

    pub fn has_fatal(&self) -> bool {
        !self.fatals.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        self.corrections.is_empty() && self.fatals.is_empty()
    }
}

/// Issues ids during a single sanitize run and detects collisions.
/// Local to the run: two configs sanitized back to back cannot see each
/// other's ids.
#[derive(Debug, Default)]
pub struct IdRegistry {
    used: FxHashSet<ItemId>,
    seq: u32,
}

impl IdRegistry {
    /// Claim an existing id; false when it is unset or already taken.
    pub fn claim(&mut self, id: ItemId) -> bool {
        !id.is_unset() && self.used.insert(id)
    }

    /// Next free deterministic id.
    pub fn generate(&mut self) -> ItemId {
        loop {
            let candidate = ItemId::from_seq(self.seq);
            self.seq = self.seq.wrapping_add(1);
            if self.used.insert(candidate) {
                return candidate;
            }
        }
    }

    fn ensure(&mut self, slot: &mut ItemId, owner_hint: ItemId, report: &mut SanitizeReport) {
        if self.claim(*slot) {
            return;
        }
        let generated = self.generate();
        if !slot.is_unset() {
            report.correct(owner_hint, format!("duplicate id {slot} regenerated as {generated}"));
        }
        *slot = generated;
    }
}

/// The union of all items' tags, used to validate tag predicates.
#[derive(Debug, Default)]
pub struct TagRegistry {
    tags: FxHashSet<String>,
}

impl TagRegistry {
    pub fn from_items(items: &[FinancialItem]) -> Self {
        let mut tags = FxHashSet::default();
        for item in items {
            tags.extend(item.tags.iter().cloned());
        }
        Self { tags }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn missing<'a>(&self, wanted: &'a [String]) -> Vec<&'a str> {
        wanted
            .iter()
            .map(String::as_str)
            .filter(|tag| !self.contains(tag))
            .collect()
    }
}

/// The full pipeline. See module docs for the step order.
pub fn sanitize_config(config: &mut Config, today: Date) -> SanitizeReport {
    let mut report = SanitizeReport::default();
    let mut registry = IdRegistry::default();

    // 1. Ids for every entity, first occurrence wins.
    for item in &mut config.items {
        assign_ids(item, &mut registry, &mut report);
    }

    // 2. Top-level normalization.
    if config.version != 1 {
        report.correct(ItemId::UNSET, format!("version {} normalized to 1", config.version));
        config.version = 1;
    }
    if config.end_of_fy.is_none() {
        config.end_of_fy = Some(jiff::civil::date(today.year(), 6, 30));
    }
    if config.years_to_sim < 1 {
        report.correct(ItemId::UNSET, "years_to_sim clamped to 1");
        config.years_to_sim = 1;
    }
    if config.start_date_is_today {
        config.start_date = Some(today);
    } else if config.start_date.is_none() {
        report.correct(ItemId::UNSET, "missing start date defaulted to today");
        config.start_date = Some(today);
    }
    if config.start_date.is_some_and(|start| start < config.birth_date) {
        tracing::warn!("simulation starts before the birth date; ages will be negative");
    }
    if config.tax_percent < Decimal::ZERO || config.tax_percent > Decimal::ONE_HUNDRED {
        let clamped = config.tax_percent.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
        report.correct(ItemId::UNSET, format!("tax_percent clamped to {clamped}"));
        config.tax_percent = clamped;
    }

    // 3. A config with no items still needs its cash-flow hub.
    if config.items.is_empty() {
        report.correct(ItemId::UNSET, "no items; default main savings synthesized");
        let mut main = FinancialItem::default_main_savings(today);
        assign_ids(&mut main, &mut registry, &mut report);
        config.items.push(main);
    }

    // 4. Per-item normalization (type invariants, schedules, legacy
    //    trigger migration, tag dedupe).
    for item in &mut config.items {
        item.sanitize(&mut report);
    }

    // 5. Main-savings election.
    let claimants: Vec<usize> = config
        .items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.is_main_savings)
        .map(|(idx, _)| idx)
        .collect();
    config.main_savings_idx = match claimants.len() {
        1 => Some(claimants[0]),
        0 => {
            report.correct(ItemId::UNSET, "no main savings item; one synthesized");
            let mut main = FinancialItem::default_main_savings(today);
            assign_ids(&mut main, &mut registry, &mut report);
            main.sanitize(&mut report);
            config.items.push(main);
            Some(config.items.len() - 1)
        }
        count => {
            report.fatal(SanitizeError::MultipleMainSavings { count });
            None
        }
    };

    // 6. The elected item must satisfy the main-savings invariants.
    if let Some(main_idx) = config.main_savings_idx {
        enforce_main_savings(&mut config.items[main_idx], today, &mut report);
    }

    // 7. Unique eval order, main savings pinned at zero.
    dedupe_eval_order(config, &mut report);

    // 8. Tag predicates may only reference tags that exist somewhere.
    let tag_registry = TagRegistry::from_items(&config.items);
    for item in &mut config.items {
        let triggers = std::iter::once(&mut item.self_trigger)
            .chain(item.events.iter_mut().map(|event| &mut event.triggers));
        for conditions in triggers {
            let owner = conditions.id;
            for rule in &mut conditions.tag_rules {
                if !rule.enabled {
                    continue;
                }
                let missing = tag_registry.missing(&rule.tags);
                if !missing.is_empty() {
                    report.correct(
                        owner,
                        format!("tag predicate references unknown tags {missing:?}; disabled"),
                    );
                    rule.enabled = false;
                }
            }
        }
    }

    // 9. Event targets must resolve to a different, existing item.
    resolve_event_targets(config, &mut report);

    report
}

fn assign_ids(item: &mut FinancialItem, registry: &mut IdRegistry, report: &mut SanitizeReport) {
    let hint = item.id;
    registry.ensure(&mut item.id, hint, report);
    let owner = item.id;
    registry.ensure(&mut item.self_trigger.id, owner, report);
    for event in &mut item.events {
        registry.ensure(&mut event.id, owner, report);
        registry.ensure(&mut event.triggers.id, event.id, report);
    }
}

fn enforce_main_savings(main: &mut FinancialItem, today: Date, report: &mut SanitizeReport) {
    let id = main.id;
    if main.item_type != ItemType::Savings {
        report.correct(id, "main savings item forced to Savings type");
        main.item_type = ItemType::Savings;
        main.share_details = None;
    }
    if !main.start_enabled {
        report.correct(id, "main savings always starts enabled");
        main.start_enabled = true;
    }
    if main.disabled_by_user {
        report.correct(id, "main savings cannot be user-disabled");
        main.disabled_by_user = false;
    }
    if !main.is_liquid_asset {
        report.correct(id, "main savings is a liquid asset");
        main.is_liquid_asset = true;
    }
    let horizon = add_years(today, 95);
    if main.end_date.is_none_or(|end| end < horizon) {
        if main.end_date.is_some() {
            report.correct(id, "main savings end date extended to the 95-year horizon");
        }
        main.end_date = Some(horizon);
    }
}

fn dedupe_eval_order(config: &mut Config, report: &mut SanitizeReport) {
    let main_idx = config.main_savings_idx;
    if let Some(main_idx) = main_idx
        && config.items[main_idx].eval_order != 0
    {
        report.correct(config.items[main_idx].id, "main savings eval order reset to 0");
        config.items[main_idx].eval_order = 0;
    }

    // Stable order of everything else, shifted upward past collisions.
    let mut rest: Vec<usize> = (0..config.items.len())
        .filter(|&idx| Some(idx) != main_idx)
        .collect();
    rest.sort_by_key(|&idx| (config.items[idx].eval_order, idx));

    let mut prev = if main_idx.is_some() { 0 } else { i32::MIN };
    for idx in rest {
        let item = &mut config.items[idx];
        if item.eval_order <= prev {
            let shifted = prev + 1;
            report.correct(
                item.id,
                format!("eval order {} collides; shifted to {shifted}", item.eval_order),
            );
            item.eval_order = shifted;
        }
        prev = item.eval_order;
    }
}

fn resolve_event_targets(config: &mut Config, report: &mut SanitizeReport) {
    let by_id: FxHashMap<ItemId, usize> = config
        .items
        .iter()
        .enumerate()
        .map(|(idx, item)| (item.id, idx))
        .collect();
    let mut by_name: FxHashMap<String, usize> = FxHashMap::default();
    for (idx, item) in config.items.iter().enumerate() {
        by_name.entry(item.name.clone()).or_insert(idx);
    }
    // Snapshot what the mutable event walk needs to know about targets.
    struct TargetInfo {
        id: ItemId,
        zero_price_shares: bool,
    }
    let infos: Vec<TargetInfo> = config
        .items
        .iter()
        .map(|item| TargetInfo {
            id: item.id,
            zero_price_shares: item.item_type == ItemType::Shares
                && item
                    .share_details
                    .as_ref()
                    .is_none_or(|details| details.unit_price.is_zero()),
        })
        .collect();

    let mut fatals: Vec<SanitizeError> = Vec::new();
    for (source_idx, item) in config.items.iter_mut().enumerate() {
        let source_id = item.id;
        for event in &mut item.events {
            if !event.enabled {
                continue;
            }
            let resolved = event
                .target_id
                .and_then(|target| by_id.get(&target).copied())
                .or_else(|| {
                    let fallback = by_name.get(&event.target_name).copied();
                    if let Some(idx) = fallback {
                        report.correct(
                            event.id,
                            format!("target resolved by name to {}", infos[idx].id),
                        );
                    }
                    fallback
                });
            match resolved {
                Some(target_idx) if target_idx == source_idx => {
                    report.correct(
                        event.id,
                        format!("event on {source_id} targets its own item; disabled"),
                    );
                    event.enabled = false;
                }
                Some(target_idx) => {
                    event.target_id = Some(infos[target_idx].id);
                    let moves_cash = event.cash_out.enabled || event.cash_in.enabled;
                    if moves_cash && infos[target_idx].zero_price_shares {
                        fatals.push(SanitizeError::ZeroUnitPrice {
                            item: infos[target_idx].id,
                        });
                    }
                }
                None => {
                    report.correct(
                        event.id,
                        format!(
                            "target {:?} ({:?}) does not resolve; event disabled",
                            event.target_id, event.target_name
                        ),
                    );
                    event.enabled = false;
                    event.target_id = None;
                }
            }
        }
    }
    for fatal in fatals {
        report.fatal(fatal);
    }
}
