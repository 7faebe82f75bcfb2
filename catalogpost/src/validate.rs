use crate::draft::DraftItem;
use crate::item::Price;
use crate::submission::SubmissionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Name,
    Photo,
    PositivePrice,
    NotInFlight,
}

impl Requirement {
    pub fn describe(&self) -> &'static str {
        match self {
            Requirement::Name => "name is required",
            Requirement::Photo => "photo is required",
            Requirement::PositivePrice => "price must be a number greater than zero",
            Requirement::NotInFlight => "a submission is already in progress",
        }
    }
}

/// Parse the price as typed by the operator, in thousands
pub fn parse_price_thousands(raw: &str) -> Option<f64> {
    let value = raw.trim().parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}

/// Sole gate on the submit action, re-evaluated on every edit and transition
pub fn is_submittable(draft: &DraftItem, state: SubmissionState) -> bool {
    missing_requirements(draft, state).is_empty()
}

pub fn missing_requirements(draft: &DraftItem, state: SubmissionState) -> Vec<Requirement> {
    let mut missing = vec![];

    if draft.name.is_empty() {
        missing.push(Requirement::Name);
    }
    if draft.photo.is_none() {
        missing.push(Requirement::Photo);
    }
    let price = parse_price_thousands(&draft.price_thousands).and_then(Price::from_thousands);
    if !price.is_some_and(|p| p.value() > 0.0) {
        missing.push(Requirement::PositivePrice);
    }
    if state.is_in_flight() {
        missing.push(Requirement::NotInFlight);
    }

    missing
}
