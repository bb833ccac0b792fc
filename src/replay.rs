use std::fmt::Display;
use std::io::{Read, Write};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
    ServiceError, Transaction, TransactionId, TransactionService,
    parse::{self, Amount},
};

// Replays a CSV of requests against a service and writes one outcome row per
// request. This is the whole "transport": it does the input validation a
// client-facing layer would do and maps core results to response statuses.

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Put,
    Get,
    Types,
    Sum,
}

// Fields that only apply to some actions are optional here and checked in
// `Request::into_transaction` / `Request::id`, the same way for every action.
#[derive(Debug, Deserialize, PartialEq)]
pub struct Request {
    pub action: Action,
    pub id: Option<TransactionId>,
    pub amount: Option<Amount>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub parent_id: Option<TransactionId>,
}

#[derive(Copy, Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum RequestError {
    MissingField(&'static str),
    EmptyType,
}

impl Display for RequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestError::MissingField(field) => {
                f.write_fmt(format_args!("{field} cannot be null"))
            }
            RequestError::EmptyType => f.write_str("type cannot be empty"),
        }
    }
}

impl Request {
    pub fn id(&self) -> Result<TransactionId, RequestError> {
        self.id.ok_or(RequestError::MissingField("id"))
    }

    pub fn kind(&self) -> Result<&str, RequestError> {
        let kind = self
            .kind
            .as_deref()
            .ok_or(RequestError::MissingField("type"))?;
        if !parse::is_valid_kind(kind) {
            return Err(RequestError::EmptyType);
        }
        Ok(kind)
    }

    pub fn into_transaction(self) -> Result<(TransactionId, Transaction), RequestError> {
        let id = self.id()?;
        let amount = self.amount.ok_or(RequestError::MissingField("amount"))?;
        let kind = self.kind()?.to_owned();
        Ok((id, Transaction::new(amount, kind, self.parent_id)))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Created,
    Ok,
    ClientError,
    NotFound,
    InternalError,
}

impl From<&ServiceError> for Status {
    fn from(err: &ServiceError) -> Self {
        match err {
            ServiceError::DuplicateIdentifier(_) | ServiceError::UnknownParent(_) => {
                Status::ClientError
            }
            ServiceError::NotFound(_) => Status::NotFound,
            ServiceError::AggregateMissing(_) => Status::InternalError,
        }
    }
}

#[derive(Debug, Default, PartialEq, Serialize)]
pub struct Outcome {
    pub action: Option<Action>,
    pub id: Option<TransactionId>,
    pub status: Option<Status>,
    pub amount: Option<Amount>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub parent_id: Option<TransactionId>,
    // space separated, ascending
    pub ids: Option<String>,
    pub sum: Option<Amount>,
    pub message: Option<String>,
}

impl Outcome {
    fn new(action: Action, id: Option<TransactionId>, status: Status) -> Self {
        Self {
            action: Some(action),
            id,
            status: Some(status),
            ..Default::default()
        }
    }

    fn failed(
        action: Option<Action>,
        id: Option<TransactionId>,
        status: Status,
        err: impl Display,
    ) -> Self {
        Self {
            action,
            id,
            status: Some(status),
            message: Some(err.to_string()),
            ..Default::default()
        }
    }

    fn from_service_error(action: Action, id: Option<TransactionId>, err: ServiceError) -> Self {
        Self::failed(Some(action), id, Status::from(&err), err)
    }
}

pub fn handle<S>(service: &S, request: Request) -> Outcome
where
    S: TransactionService + ?Sized,
{
    let action = request.action;
    let id = request.id;
    debug!("Handling {:?}", request);

    match action {
        Action::Put => match request.into_transaction() {
            Ok((id, transaction)) => match service.add(id, transaction) {
                Ok(()) => Outcome::new(action, Some(id), Status::Created),
                Err(err) => Outcome::from_service_error(action, Some(id), err),
            },
            Err(err) => Outcome::failed(Some(action), id, Status::ClientError, err),
        },
        Action::Get => match request.id() {
            Ok(id) => match service.get(id) {
                Ok(transaction) => Outcome {
                    amount: Some(transaction.amount),
                    kind: Some(transaction.kind),
                    parent_id: transaction.parent_id,
                    ..Outcome::new(action, Some(id), Status::Ok)
                },
                Err(err) => Outcome::from_service_error(action, Some(id), err),
            },
            Err(err) => Outcome::failed(Some(action), id, Status::ClientError, err),
        },
        Action::Types => match request.kind() {
            Ok(kind) => {
                let ids = service
                    .ids_by_type(kind)
                    .iter()
                    .map(TransactionId::to_string)
                    .collect::<Vec<_>>()
                    .join(" ");
                Outcome {
                    kind: Some(kind.to_owned()),
                    ids: Some(ids),
                    ..Outcome::new(action, None, Status::Ok)
                }
            }
            Err(err) => Outcome::failed(Some(action), id, Status::ClientError, err),
        },
        Action::Sum => match request.id() {
            Ok(id) => match service.subtree_sum(id) {
                Ok(sum) => Outcome {
                    sum: Some(sum),
                    ..Outcome::new(action, Some(id), Status::Ok)
                },
                Err(err) => Outcome::from_service_error(action, Some(id), err),
            },
            Err(err) => Outcome::failed(Some(action), id, Status::ClientError, err),
        },
    }
}

// Returns the number of rows processed. Malformed rows are reported as
// client errors and skipped; only I/O and CSV-writer failures abort.
pub fn replay<S, R, W>(
    service: &S,
    reader: &mut csv::Reader<R>,
    writer: &mut csv::Writer<W>,
) -> anyhow::Result<usize>
where
    S: TransactionService + ?Sized,
    R: Read,
    W: Write,
{
    let mut rows = 0;
    for row in reader.deserialize::<Request>() {
        rows += 1;
        let outcome = match row {
            Ok(request) => handle(service, request),
            Err(err) if err.is_io_error() => return Err(err.into()),
            Err(err) => {
                warn!("Skipping malformed request: {}", err);
                Outcome::failed(None, None, Status::ClientError, err)
            }
        };
        writer.serialize(&outcome)?;
    }
    writer.flush()?;

    Ok(rows)
}

pub fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.trim(csv::Trim::All).flexible(true);
    builder
}
