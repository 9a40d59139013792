//! In-person sale models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TutorRef;

/// A point-of-sale ticket (`ventas_presenciales`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sale {
    pub id: String,
    pub tutor: TutorRef,
    /// Ticket total in local currency
    pub total: f64,
    pub created_at: DateTime<Utc>,
    pub items: Vec<SaleItem>,
}

/// Single line on a sale ticket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SaleItem {
    pub name: String,
    pub quantity: u32,
}

impl Sale {
    /// Create a sale dated now.
    pub fn new(tutor: TutorRef, total: f64, items: Vec<SaleItem>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            tutor,
            total,
            created_at: Utc::now(),
            items,
        }
    }

    /// Total number of units across all lines.
    pub fn unit_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_count() {
        let sale = Sale::new(
            TutorRef {
                id: "t1".into(),
                name: "Ana".into(),
            },
            120.0,
            vec![
                SaleItem {
                    name: "Croquetas 3kg".into(),
                    quantity: 2,
                },
                SaleItem {
                    name: "Pipeta".into(),
                    quantity: 1,
                },
            ],
        );
        assert_eq!(sale.unit_count(), 3);
    }
}
