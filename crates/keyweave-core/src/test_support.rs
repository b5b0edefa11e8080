//! Shared row fixtures for unit tests.

use crate::{
    index::{ForeignIndex, UniqueIndex},
    row::{RecordVersion, Row, Versioned},
};
use std::rc::Rc;

// Walk a snapshot chain down to its oldest entry.
fn original<T>(row: &T, previous: impl Fn(&T) -> Option<&T>) -> &T {
    let mut current = row;
    while let Some(older) = previous(current) {
        current = older;
    }

    current
}

///
/// Customer
///

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Customer {
    pub(crate) id: u32,
    pub(crate) code: String,
    pub(crate) active: bool,
    pub(crate) previous: Option<Box<Self>>,
}

impl Customer {
    pub(crate) fn new(id: u32, code: &str) -> Self {
        Self {
            id,
            code: code.to_string(),
            active: true,
            previous: None,
        }
    }

    // Next version with a different code.
    pub(crate) fn rekeyed(&self, code: &str) -> Self {
        Self {
            code: code.to_string(),
            previous: Some(Box::new(self.clone())),
            ..self.clone()
        }
    }

    pub(crate) fn deactivated(&self) -> Self {
        Self {
            active: false,
            previous: Some(Box::new(self.clone())),
            ..self.clone()
        }
    }
}

impl Row for Customer {
    type Id = u32;

    fn id(&self) -> u32 {
        self.id
    }
}

impl Versioned for Customer {
    fn get_version(&self, version: RecordVersion) -> &Self {
        match version {
            RecordVersion::Current => self,
            RecordVersion::Previous => self.previous.as_deref().unwrap_or(self),
            RecordVersion::Original => original(self, |row| row.previous.as_deref()),
        }
    }
}

///
/// Order
///

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Order {
    pub(crate) id: u32,
    pub(crate) customer: Option<String>,
    pub(crate) previous: Option<Box<Self>>,
}

impl Order {
    pub(crate) fn new(id: u32, customer: Option<&str>) -> Self {
        Self {
            id,
            customer: customer.map(str::to_string),
            previous: None,
        }
    }

    pub(crate) fn reassigned(&self, customer: Option<&str>) -> Self {
        Self {
            id: self.id,
            customer: customer.map(str::to_string),
            previous: Some(Box::new(self.clone())),
        }
    }
}

impl Row for Order {
    type Id = u32;

    fn id(&self) -> u32 {
        self.id
    }
}

impl Versioned for Order {
    fn get_version(&self, version: RecordVersion) -> &Self {
        match version {
            RecordVersion::Current => self,
            RecordVersion::Previous => self.previous.as_deref().unwrap_or(self),
            RecordVersion::Original => original(self, |row| row.previous.as_deref()),
        }
    }
}

/// Unique index over active customer codes.
pub(crate) fn customer_pk() -> Rc<UniqueIndex<String, Customer>> {
    UniqueIndex::builder("customer.pk")
        .has_index(|row: &Customer| row.code.clone())
        .has_filter(|row: &Customer| row.active)
        .build()
        .expect("customer index config")
}

/// Foreign index from orders to customers; unassigned orders are skipped.
pub(crate) fn order_customer_fk(
    customers: &Rc<UniqueIndex<String, Customer>>,
) -> Rc<ForeignIndex<String, Order, Customer>> {
    ForeignIndex::builder("order.customer", customers)
        .has_index(|row: &Order| row.customer.clone().unwrap_or_default())
        .has_filter(|row: &Order| row.customer.is_some())
        .build()
        .expect("order index config")
}
