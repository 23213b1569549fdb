use crate::card::{ManaColor, ManaCost};
use serde::{Deserialize, Serialize};
use thiserror::Error;

fn is_zero(n: &u32) -> bool {
    *n == 0
}

/// Mana pool tracking each color and colorless mana.
///
/// Payments use the same shape: how much of each color is spent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManaPool {
    #[serde(rename = "W", default, skip_serializing_if = "is_zero")]
    pub white: u32,
    #[serde(rename = "U", default, skip_serializing_if = "is_zero")]
    pub blue: u32,
    #[serde(rename = "B", default, skip_serializing_if = "is_zero")]
    pub black: u32,
    #[serde(rename = "R", default, skip_serializing_if = "is_zero")]
    pub red: u32,
    #[serde(rename = "G", default, skip_serializing_if = "is_zero")]
    pub green: u32,
    #[serde(rename = "C", default, skip_serializing_if = "is_zero")]
    pub colorless: u32,
}

/// Amount of each color spent on a cost
pub type Payment = ManaPool;

impl ManaPool {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, color: ManaColor) -> &mut u32 {
        match color {
            ManaColor::White => &mut self.white,
            ManaColor::Blue => &mut self.blue,
            ManaColor::Black => &mut self.black,
            ManaColor::Red => &mut self.red,
            ManaColor::Green => &mut self.green,
            ManaColor::Colorless => &mut self.colorless,
        }
    }

    pub fn amount(&self, color: ManaColor) -> u32 {
        match color {
            ManaColor::White => self.white,
            ManaColor::Blue => self.blue,
            ManaColor::Black => self.black,
            ManaColor::Red => self.red,
            ManaColor::Green => self.green,
            ManaColor::Colorless => self.colorless,
        }
    }

    /// Add mana of a specific color
    pub fn add(&mut self, color: ManaColor, amount: u32) {
        *self.slot(color) += amount;
    }

    /// Remove up to `amount` of a color, returning how much was actually taken
    pub fn take(&mut self, color: ManaColor, amount: u32) -> u32 {
        let slot = self.slot(color);
        let taken = (*slot).min(amount);
        *slot -= taken;
        taken
    }

    pub fn total(&self) -> u32 {
        self.white + self.blue + self.black + self.red + self.green + self.colorless
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Clear the mana pool
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Per-symbol choices for costs with hybrid, two-brid, or phyrexian symbols.
/// Index `i` of each list answers symbol `i` of the matching cost list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetail {
    /// Chosen color for each hybrid pair
    #[serde(default)]
    pub hybrid: Vec<ManaColor>,
    /// `true` pays the two-brid symbol with its color, `false` with generic mana
    #[serde(default)]
    pub two_brid_pay_color: Vec<bool>,
    /// `true` pays the phyrexian symbol with life, `false` with mana
    #[serde(default)]
    pub phyrexian_pay_life: Vec<bool>,
}

/// Why a payment does not satisfy a cost. `Display` is the message shown to the player.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ManaPaymentError {
    #[error("Missing required {0} mana.")]
    MissingColoredMana(ManaColor),
    #[error("Missing required colorless mana.")]
    MissingColorlessMana,
    #[error("Not enough mana paid: {paid} of {required}.")]
    InsufficientTotal { required: u32, paid: u32 },
    #[error("Paid more {0} mana than is available.")]
    OverpaidColor(ManaColor),
    #[error("Invalid choice for hybrid symbol {index}.")]
    InvalidHybridChoice { index: usize },
    #[error("Not enough {0} mana for hybrid cost.")]
    InsufficientHybridMana(ManaColor),
    #[error("Not enough {0} mana for two-brid cost.")]
    InsufficientTwoBridMana(ManaColor),
    #[error("Not enough {0} mana for phyrexian cost.")]
    InsufficientPhyrexianMana(ManaColor),
    #[error("Not enough mana for generic cost ({missing} missing).")]
    InsufficientGenericMana { missing: u32 },
    #[error("Hybrid/phyrexian costs require auto-pay.")]
    ComplexCostRequiresAutoPay,
}

/// Outcome of resolving a cost against a pool with explicit choices
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentResolution {
    pub payment: Payment,
    pub errors: Vec<ManaPaymentError>,
}

impl PaymentResolution {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.to_string()).collect()
    }
}

/// Spend up to `amount` of leftover pool mana on generic, in GENERIC_ORDER.
/// Returns the unpaid remainder.
fn spread_generic(remaining: &mut ManaPool, payment: &mut Payment, amount: u32) -> u32 {
    let mut left = amount;
    for color in ManaColor::GENERIC_ORDER {
        if left == 0 {
            break;
        }
        let paid = remaining.take(color, left);
        payment.add(color, paid);
        left -= paid;
    }
    left
}

/// Default payment for a simple cost.
///
/// Costs with hybrid, two-brid, or phyrexian symbols have no safe default and
/// yield an empty payment. Never pays more of a color than the pool holds.
pub fn build_default_payment(cost: &ManaCost, pool: &ManaPool) -> Payment {
    let mut payment = Payment::new();
    if cost.is_complex() {
        return payment;
    }

    let mut remaining = *pool;
    for color in ManaColor::COLORS {
        let paid = remaining.take(color, cost.colored_required(color));
        payment.add(color, paid);
    }
    let paid = remaining.take(ManaColor::Colorless, cost.colorless_required());
    payment.add(ManaColor::Colorless, paid);

    spread_generic(&mut remaining, &mut payment, cost.generic);
    payment
}

/// Default choices for each choice symbol, based on what the pool holds
pub fn build_default_payment_detail(cost: &ManaCost, pool: &ManaPool) -> PaymentDetail {
    let hybrid = cost
        .hybrids
        .iter()
        .map(|(a, b)| if pool.amount(*a) > 0 { *a } else { *b })
        .collect();
    let two_brid_pay_color = cost
        .two_brids
        .iter()
        .map(|(_, color)| pool.amount(*color) > 0)
        .collect();
    let phyrexian_pay_life = cost
        .phyrexian
        .iter()
        .map(|color| pool.amount(*color) == 0)
        .collect();

    PaymentDetail {
        hybrid,
        two_brid_pay_color,
        phyrexian_pay_life,
    }
}

/// Resolve a full payment from explicit choices against a shrinking copy of the pool.
///
/// Steps run in a fixed order: colored, hybrid, two-brid, phyrexian, colorless,
/// generic. A step that cannot be met records an error and resolution continues.
pub fn build_payment_from_detail(
    cost: &ManaCost,
    pool: &ManaPool,
    detail: &PaymentDetail,
) -> PaymentResolution {
    let mut remaining = *pool;
    let mut payment = Payment::new();
    let mut errors = Vec::new();

    for color in ManaColor::COLORS {
        let needed = cost.colored_required(color);
        let paid = remaining.take(color, needed);
        payment.add(color, paid);
        if paid < needed {
            errors.push(ManaPaymentError::MissingColoredMana(color));
        }
    }

    for (index, (a, b)) in cost.hybrids.iter().enumerate() {
        match detail.hybrid.get(index) {
            Some(choice) if choice == a || choice == b => {
                if remaining.take(*choice, 1) == 1 {
                    payment.add(*choice, 1);
                } else {
                    errors.push(ManaPaymentError::InsufficientHybridMana(*choice));
                }
            }
            _ => errors.push(ManaPaymentError::InvalidHybridChoice { index }),
        }
    }

    let mut generic = cost.generic;
    for (index, (amount, color)) in cost.two_brids.iter().enumerate() {
        let pay_color = detail.two_brid_pay_color.get(index).copied().unwrap_or(false);
        if !pay_color {
            generic += amount;
        } else if remaining.take(*color, 1) == 1 {
            payment.add(*color, 1);
        } else {
            errors.push(ManaPaymentError::InsufficientTwoBridMana(*color));
        }
    }

    // Life payments are the rules engine's to validate.
    for (index, color) in cost.phyrexian.iter().enumerate() {
        let pay_life = detail.phyrexian_pay_life.get(index).copied().unwrap_or(false);
        if pay_life {
            continue;
        }
        if remaining.take(*color, 1) == 1 {
            payment.add(*color, 1);
        } else {
            errors.push(ManaPaymentError::InsufficientPhyrexianMana(*color));
        }
    }

    let needed = cost.colorless_required();
    let paid = remaining.take(ManaColor::Colorless, needed);
    payment.add(ManaColor::Colorless, paid);
    if paid < needed {
        errors.push(ManaPaymentError::MissingColorlessMana);
    }

    let missing = spread_generic(&mut remaining, &mut payment, generic);
    if missing > 0 {
        errors.push(ManaPaymentError::InsufficientGenericMana { missing });
    }

    PaymentResolution { payment, errors }
}

/// Validate a manually entered payment. Only simple costs can be checked here.
pub fn payment_errors(cost: &ManaCost, payment: &Payment, pool: &ManaPool) -> Vec<ManaPaymentError> {
    if cost.is_complex() {
        return vec![ManaPaymentError::ComplexCostRequiresAutoPay];
    }

    let mut errors = Vec::new();

    let required = cost.total_value();
    let paid = payment.total();
    if paid < required {
        errors.push(ManaPaymentError::InsufficientTotal { required, paid });
    }

    for color in ManaColor::COLORS {
        if payment.amount(color) < cost.colored_required(color) {
            errors.push(ManaPaymentError::MissingColoredMana(color));
        }
    }

    if payment.amount(ManaColor::Colorless) < cost.colorless_required() {
        errors.push(ManaPaymentError::MissingColorlessMana);
    }

    for color in ManaColor::GENERIC_ORDER {
        if payment.amount(color) > pool.amount(color) {
            errors.push(ManaPaymentError::OverpaidColor(color));
        }
    }

    errors
}
