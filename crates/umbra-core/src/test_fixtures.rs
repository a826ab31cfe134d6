//! Sample domain used by unit tests.
//!
//! `Customer` owns a collection of `Order`s, each `Order` owns its
//! `OrderLine`s and points back at its customer. `Address` is a value
//! object without an id.

use crate::{
    model::{
        Attribute, ClassDeclaration, MethodDeclaration, ParameterDeclaration, PropertyDeclaration,
        Relationship,
    },
    traits::{Declare, DomainObject, MemberError},
    types::{CollectionRef, ObjectRef},
    value::{Value, ValueKind},
};
use ulid::Ulid;

///
/// Customer
///

pub(crate) struct Customer {
    pub id: Ulid,
    pub version: i64,
    pub name: String,
    pub email: Option<String>,
    pub orders: CollectionRef,
    pub address: Option<ObjectRef>,
}

impl Customer {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            id: Ulid::new(),
            version: 0,
            name: name.to_string(),
            email: None,
            orders: CollectionRef::new::<Order>(),
            address: None,
        }
    }
}

impl Declare for Customer {
    fn declaration() -> ClassDeclaration {
        ClassDeclaration::new("Customer")
            .aggregate_root()
            .property(PropertyDeclaration::new("id", ValueKind::ULID))
            .property(PropertyDeclaration::new("version", ValueKind::INT))
            .property(
                PropertyDeclaration::new("name", ValueKind::TEXT)
                    .attribute(Attribute::Required(true))
                    .attribute(Attribute::MaxLength(50)),
            )
            .property(PropertyDeclaration::new("email", ValueKind::TEXT))
            .property(
                PropertyDeclaration::new("orders", ValueKind::collection::<Order>())
                    .attribute(Attribute::Relationship(Relationship::Owns)),
            )
            .property(
                PropertyDeclaration::new("address", ValueKind::object::<Address>())
                    .attribute(Attribute::Relationship(Relationship::Owns)),
            )
            .method(
                MethodDeclaration::new("rename")
                    .parameter(ParameterDeclaration::new("first", ValueKind::TEXT))
                    .parameter(
                        ParameterDeclaration::new("last", ValueKind::TEXT)
                            .attribute(Attribute::Required(false)),
                    ),
            )
            .method(
                MethodDeclaration::new("add_orders")
                    .parameter(ParameterDeclaration::new("count", ValueKind::INT))
                    .returns(ValueKind::INT),
            )
            .field("_name", ValueKind::TEXT)
            .field("m_email", ValueKind::TEXT)
            .constructor(|| ObjectRef::new(Self::new("")))
    }
}

impl DomainObject for Customer {
    fn get(&self, name: &str) -> Result<Value, MemberError> {
        Ok(match name {
            "id" => Value::Ulid(self.id),
            "version" => Value::Int(self.version),
            "name" => Value::text(&self.name),
            "email" => self.email.clone().into(),
            "orders" => Value::Collection(self.orders.clone()),
            "address" => self.address.clone().into(),
            other => return Err(MemberError::Unknown(other.to_string())),
        })
    }

    fn set(&mut self, name: &str, value: Value) -> Result<(), MemberError> {
        match name {
            "id" => self.id = value.cast(name)?,
            "version" => self.version = value.cast(name)?,
            "name" => self.name = value.cast(name)?,
            "email" => self.email = value.cast(name)?,
            "orders" => self.orders = value.cast(name)?,
            "address" => self.address = value.cast(name)?,
            other => return Err(MemberError::Unknown(other.to_string())),
        }

        Ok(())
    }

    fn invoke(&mut self, name: &str, args: &[Value]) -> Result<Value, MemberError> {
        match name {
            "rename" => {
                let first: String = MemberError::argument(args, 0, name)?.cast("first")?;
                let last: Option<String> = MemberError::argument(args, 1, name)?.cast("last")?;
                self.name = match last {
                    Some(last) => format!("{first} {last}"),
                    None => first,
                };
                Ok(Value::Null)
            }
            "add_orders" => {
                let count: i64 = MemberError::argument(args, 0, name)?.cast("count")?;
                if count < 0 {
                    return Err(MemberError::Rejected("count must not be negative".to_string()));
                }
                for n in 0..count {
                    let order = Order::new(&format!("{}-{n}", self.name));
                    self.orders.push(ObjectRef::new(order));
                }
                Ok(Value::Int(count))
            }
            other => Err(MemberError::Unknown(other.to_string())),
        }
    }

    fn check_consistency(&self) -> Result<(), Vec<String>> {
        if self.name.trim().is_empty() {
            return Err(vec!["customer name must not be blank".to_string()]);
        }

        Ok(())
    }
}

///
/// Order
///

pub(crate) struct Order {
    pub id: Ulid,
    pub code: String,
    pub lines: CollectionRef,
    pub customer: Option<ObjectRef>,
}

impl Order {
    pub(crate) fn new(code: &str) -> Self {
        Self {
            id: Ulid::new(),
            code: code.to_string(),
            lines: CollectionRef::new::<OrderLine>(),
            customer: None,
        }
    }
}

impl Declare for Order {
    fn declaration() -> ClassDeclaration {
        ClassDeclaration::new("Order")
            .entity()
            .property(PropertyDeclaration::new("order_id", ValueKind::ULID))
            .property(PropertyDeclaration::new("code", ValueKind::TEXT))
            .property(
                PropertyDeclaration::new("lines", ValueKind::collection::<OrderLine>())
                    .attribute(Attribute::Relationship(Relationship::Owns)),
            )
            .property(
                PropertyDeclaration::new("customer", ValueKind::object::<Customer>())
                    .attribute(Attribute::Relationship(Relationship::OwnedBy)),
            )
            .method(
                MethodDeclaration::new("add_line")
                    .parameter(ParameterDeclaration::new("product", ValueKind::TEXT))
                    .parameter(ParameterDeclaration::new("quantity", ValueKind::INT))
                    .returns(ValueKind::object::<OrderLine>()),
            )
            .constructor(|| ObjectRef::new(Self::new("")))
    }
}

impl DomainObject for Order {
    fn get(&self, name: &str) -> Result<Value, MemberError> {
        Ok(match name {
            "order_id" => Value::Ulid(self.id),
            "code" => Value::text(&self.code),
            "lines" => Value::Collection(self.lines.clone()),
            "customer" => self.customer.clone().into(),
            other => return Err(MemberError::Unknown(other.to_string())),
        })
    }

    fn set(&mut self, name: &str, value: Value) -> Result<(), MemberError> {
        match name {
            "order_id" => self.id = value.cast(name)?,
            "code" => self.code = value.cast(name)?,
            "lines" => self.lines = value.cast(name)?,
            "customer" => self.customer = value.cast(name)?,
            other => return Err(MemberError::Unknown(other.to_string())),
        }

        Ok(())
    }

    fn invoke(&mut self, name: &str, args: &[Value]) -> Result<Value, MemberError> {
        match name {
            "add_line" => {
                let product: String = MemberError::argument(args, 0, name)?.cast("product")?;
                let quantity: i64 = MemberError::argument(args, 1, name)?.cast("quantity")?;
                let line = ObjectRef::new(OrderLine::new(&product, quantity));
                self.lines.push(line.clone());
                Ok(Value::Object(line))
            }
            other => Err(MemberError::Unknown(other.to_string())),
        }
    }
}

///
/// OrderLine
///

pub(crate) struct OrderLine {
    pub id: Ulid,
    pub product: String,
    pub quantity: i64,
}

impl OrderLine {
    pub(crate) fn new(product: &str, quantity: i64) -> Self {
        Self {
            id: Ulid::new(),
            product: product.to_string(),
            quantity,
        }
    }
}

impl Declare for OrderLine {
    fn declaration() -> ClassDeclaration {
        ClassDeclaration::new("OrderLine")
            .entity()
            .property(PropertyDeclaration::new("id", ValueKind::ULID).attribute(Attribute::Key))
            .property(PropertyDeclaration::new("product", ValueKind::TEXT))
            .property(PropertyDeclaration::new("quantity", ValueKind::INT))
            .constructor(|| ObjectRef::new(Self::new("", 1)))
    }
}

impl DomainObject for OrderLine {
    fn get(&self, name: &str) -> Result<Value, MemberError> {
        Ok(match name {
            "id" => Value::Ulid(self.id),
            "product" => Value::text(&self.product),
            "quantity" => Value::Int(self.quantity),
            other => return Err(MemberError::Unknown(other.to_string())),
        })
    }

    fn set(&mut self, name: &str, value: Value) -> Result<(), MemberError> {
        match name {
            "id" => self.id = value.cast(name)?,
            "product" => self.product = value.cast(name)?,
            "quantity" => self.quantity = value.cast(name)?,
            other => return Err(MemberError::Unknown(other.to_string())),
        }

        Ok(())
    }

    fn check_consistency(&self) -> Result<(), Vec<String>> {
        if self.quantity <= 0 {
            return Err(vec![format!(
                "quantity for {} must be positive",
                self.product
            )]);
        }

        Ok(())
    }
}

///
/// Address
///

pub(crate) struct Address {
    pub street: String,
    pub city: String,
}

impl Address {
    pub(crate) fn new(street: &str, city: &str) -> Self {
        Self {
            street: street.to_string(),
            city: city.to_string(),
        }
    }
}

impl Declare for Address {
    fn declaration() -> ClassDeclaration {
        ClassDeclaration::new("Address")
            .value_object()
            .property(PropertyDeclaration::new("street", ValueKind::TEXT))
            .property(PropertyDeclaration::new("city", ValueKind::TEXT))
    }
}

impl DomainObject for Address {
    fn get(&self, name: &str) -> Result<Value, MemberError> {
        Ok(match name {
            "street" => Value::text(&self.street),
            "city" => Value::text(&self.city),
            other => return Err(MemberError::Unknown(other.to_string())),
        })
    }

    fn set(&mut self, name: &str, value: Value) -> Result<(), MemberError> {
        match name {
            "street" => self.street = value.cast(name)?,
            "city" => self.city = value.cast(name)?,
            other => return Err(MemberError::Unknown(other.to_string())),
        }

        Ok(())
    }
}
