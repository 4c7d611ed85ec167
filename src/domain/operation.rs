use crate::domain::fields;
use crate::error::{PaytpvError, Result};
use std::fmt;
use std::str::FromStr;

/// Remote operations exposed by the gateway's SOAP service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    AddUser,
    InfoUser,
    RemoveUser,
    ExecutePurchase,
    ExecuteRefund,
}

/// What the dispatcher needs to know about one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationDescriptor {
    pub operation: Operation,
    /// Name of the remote method on the SOAP service.
    pub remote_method: &'static str,
    /// Fields concatenated, in this order, to build the request signature.
    /// Must match the gateway's server-side list verbatim.
    pub signed_fields: &'static [&'static str],
}

const OPERATIONS: [OperationDescriptor; 5] = [
    OperationDescriptor {
        operation: Operation::AddUser,
        remote_method: "add_user",
        signed_fields: &[fields::MERCHANT_CODE, fields::PAN, fields::CVV, fields::TERMINAL],
    },
    OperationDescriptor {
        operation: Operation::InfoUser,
        remote_method: "info_user",
        signed_fields: &[
            fields::MERCHANT_CODE,
            fields::USER_ID,
            fields::USER_TOKEN,
            fields::TERMINAL,
        ],
    },
    OperationDescriptor {
        operation: Operation::RemoveUser,
        remote_method: "remove_user",
        signed_fields: &[
            fields::MERCHANT_CODE,
            fields::USER_ID,
            fields::USER_TOKEN,
            fields::TERMINAL,
        ],
    },
    OperationDescriptor {
        operation: Operation::ExecutePurchase,
        remote_method: "execute_purchase",
        signed_fields: &[
            fields::MERCHANT_CODE,
            fields::USER_ID,
            fields::USER_TOKEN,
            fields::TERMINAL,
            fields::AMOUNT,
            fields::ORDER,
        ],
    },
    OperationDescriptor {
        operation: Operation::ExecuteRefund,
        remote_method: "execute_refund",
        signed_fields: &[
            fields::MERCHANT_CODE,
            fields::USER_ID,
            fields::USER_TOKEN,
            fields::TERMINAL,
            fields::AUTH_CODE,
            fields::ORDER,
        ],
    },
];

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::AddUser,
        Operation::InfoUser,
        Operation::RemoveUser,
        Operation::ExecutePurchase,
        Operation::ExecuteRefund,
    ];

    pub fn descriptor(self) -> &'static OperationDescriptor {
        let index = match self {
            Operation::AddUser => 0,
            Operation::InfoUser => 1,
            Operation::RemoveUser => 2,
            Operation::ExecutePurchase => 3,
            Operation::ExecuteRefund => 4,
        };
        &OPERATIONS[index]
    }

    pub fn remote_method(self) -> &'static str {
        self.descriptor().remote_method
    }

    pub fn signed_fields(self) -> &'static [&'static str] {
        self.descriptor().signed_fields
    }

    /// Looks an operation up by its remote method name.
    pub fn from_remote_method(name: &str) -> Option<Self> {
        OPERATIONS
            .iter()
            .find(|d| d.remote_method == name)
            .map(|d| d.operation)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.remote_method())
    }
}

impl FromStr for Operation {
    type Err = PaytpvError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_remote_method(s)
            .ok_or_else(|| PaytpvError::validation(format!("Unknown operation: {s}")))
    }
}
