/// Capital and position state for one simulation run. Owned exclusively by
/// the engine between run start and metrics derivation.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioState {
    cash: f64,
    position_qty: f64,
    entry_price: Option<f64>,
}

impl PortfolioState {
    pub fn new(cash: f64, position_qty: f64) -> Self {
        Self {
            cash,
            position_qty,
            entry_price: None,
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn position_qty(&self) -> f64 {
        self.position_qty
    }

    /// Fill price of the most recent opening trade; `None` once the position
    /// has been fully closed (or when the position was seeded at run start).
    pub fn entry_price(&self) -> Option<f64> {
        self.entry_price
    }

    /// Mark-to-market value: cash plus position at the given price.
    pub fn value(&self, price: f64) -> f64 {
        self.cash + self.position_qty * price
    }

    /// Deploy `spend` of cash at `price`. Caller guarantees `spend <= cash`
    /// and `price > 0`.
    pub fn apply_buy(&mut self, spend: f64, price: f64) {
        if spend <= 0.0 || price <= 0.0 {
            return;
        }
        let quantity = spend / price;
        self.cash -= spend;
        self.position_qty += quantity;
        self.entry_price = Some(price);
    }

    /// Liquidate up to `quantity` units at `price`. The sold quantity is
    /// clamped to the held quantity, so the position never goes negative.
    /// The entry price is cleared only on a full close.
    pub fn apply_sell(&mut self, quantity: f64, price: f64) {
        if quantity <= 0.0 || self.position_qty <= 0.0 {
            return;
        }
        let sold = quantity.min(self.position_qty);
        self.cash += sold * price;
        self.position_qty -= sold;
        if self.position_qty <= 0.0 {
            self.position_qty = 0.0;
            self.entry_price = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PortfolioState;

    #[test]
    fn buy_then_sell_updates_cash_and_position() {
        let mut portfolio = PortfolioState::new(1000.0, 0.0);
        portfolio.apply_buy(500.0, 100.0);
        assert!((portfolio.cash() - 500.0).abs() < 1e-9);
        assert!((portfolio.position_qty() - 5.0).abs() < 1e-9);
        assert_eq!(portfolio.entry_price(), Some(100.0));

        portfolio.apply_sell(5.0, 110.0);
        assert!((portfolio.cash() - 1050.0).abs() < 1e-9);
        assert_eq!(portfolio.position_qty(), 0.0);
        assert_eq!(portfolio.entry_price(), None);
    }

    #[test]
    fn partial_sell_keeps_entry_price() {
        let mut portfolio = PortfolioState::new(1000.0, 0.0);
        portfolio.apply_buy(1000.0, 100.0);
        portfolio.apply_sell(4.0, 100.0);
        assert!((portfolio.position_qty() - 6.0).abs() < 1e-9);
        assert_eq!(portfolio.entry_price(), Some(100.0));
    }

    #[test]
    fn oversized_sell_clamps_to_held_quantity() {
        let mut portfolio = PortfolioState::new(0.0, 2.0);
        portfolio.apply_sell(10.0, 50.0);
        assert_eq!(portfolio.position_qty(), 0.0);
        assert!((portfolio.cash() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn value_is_cash_plus_marked_position() {
        let mut portfolio = PortfolioState::new(400.0, 0.0);
        portfolio.apply_buy(200.0, 20.0);
        assert!((portfolio.value(25.0) - (200.0 + 10.0 * 25.0)).abs() < 1e-9);
    }
}
