use super::constants::{SELECTABLE_SLIPPAGES, SLIPPAGE_WARNING_THRESHOLD};
use super::dec::{parse_dec, PrettyDec};
use crate::error::TradeError;
use bigdecimal::BigDecimal;
use num_traits::Zero;
use std::str::FromStr;

/// Parses a slippage tolerance in percent ("0.5" means 0.5%) into a ratio.
pub fn parse_slippage_percent(value: &str) -> Result<BigDecimal, TradeError> {
    let percent = parse_dec(value).ok_or_else(|| TradeError::InvalidSlippage(value.to_string()))?;
    if percent < BigDecimal::zero() {
        return Err(TradeError::NegativeSlippage);
    }
    if percent > BigDecimal::from(100u32) {
        return Err(TradeError::InvalidSlippage(value.to_string()));
    }
    Ok(percent / BigDecimal::from(100u32))
}

#[derive(Clone, Debug, PartialEq)]
pub struct SelectableSlippage {
    pub index: usize,
    pub slippage: PrettyDec,
    pub selected: bool,
}

/// Slippage tolerance: one of a few presets, or a percentage typed by the
/// user. A bad manual value is not rejected on input; it is reported by
/// [`SlippageConfig::manual_slippage_error`] and counts as zero tolerance.
#[derive(Clone, Debug, PartialEq)]
pub struct SlippageConfig {
    // Percent values
    selectable: Vec<BigDecimal>,
    selected_index: usize,
    is_manual: bool,
    manual_slippage: String,
}

impl Default for SlippageConfig {
    fn default() -> Self {
        Self {
            selectable: SELECTABLE_SLIPPAGES
                .iter()
                .filter_map(|percent| BigDecimal::from_str(percent).ok())
                .collect(),
            selected_index: 0,
            is_manual: false,
            manual_slippage: String::new(),
        }
    }
}

impl SlippageConfig {
    pub fn selectable_slippages(&self) -> Vec<SelectableSlippage> {
        self.selectable
            .iter()
            .enumerate()
            .map(|(index, percent)| SelectableSlippage {
                index,
                slippage: PrettyDec::new(percent.clone()).max_decimals(2).trim(true),
                selected: !self.is_manual && index == self.selected_index,
            })
            .collect()
    }

    pub fn select(&mut self, index: usize) {
        if index < self.selectable.len() {
            self.selected_index = index;
            self.is_manual = false;
        }
    }

    pub fn is_manual_slippage(&self) -> bool {
        self.is_manual
    }

    pub fn set_is_manual_slippage(&mut self, is_manual: bool) {
        self.is_manual = is_manual;
    }

    pub fn manual_slippage_str(&self) -> &str {
        &self.manual_slippage
    }

    pub fn set_manual_slippage(&mut self, value: &str) {
        let value = value.trim();
        self.manual_slippage = if value.starts_with('.') {
            format!("0{}", value)
        } else {
            value.to_string()
        };
    }

    pub fn manual_slippage_error(&self) -> Option<TradeError> {
        if !self.is_manual {
            return None;
        }
        parse_slippage_percent(&self.manual_slippage).err()
    }

    // Tolerance as a ratio, 0.01 for 1%
    pub fn slippage(&self) -> BigDecimal {
        if self.is_manual {
            return parse_slippage_percent(&self.manual_slippage).unwrap_or_else(|_| BigDecimal::zero());
        }
        self.selectable
            .get(self.selected_index)
            .map(|percent| percent / BigDecimal::from(100u32))
            .unwrap_or_else(BigDecimal::zero)
    }

    /// True when the estimated slippage (a ratio) is above the tolerance, or
    /// above 10% regardless of the tolerance.
    pub fn exceeds_tolerance(&self, estimated: &BigDecimal) -> bool {
        let threshold = BigDecimal::from_str(SLIPPAGE_WARNING_THRESHOLD).unwrap_or_else(|_| BigDecimal::zero());
        self.slippage() < *estimated || *estimated > threshold
    }
}
