use axum::extract::{Path, State};
use axum::response::Response;

use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, empty_success, success};

pub async fn issue_ticket(State(state): State<AppState>) -> Result<Response, AppError> {
    let ticket = state.ledger.issue_ticket().await?;
    Ok(created(ticket, "New ticket issued"))
}

pub async fn call_next(State(state): State<AppState>) -> Result<Response, AppError> {
    match state.ledger.call_next().await? {
        Some(ticket) => Ok(success(ticket, "Next ticket called")),
        None => Ok(empty_success("No waiting tickets")),
    }
}

pub async fn complete_ticket(
    State(state): State<AppState>,
    Path(number): Path<String>,
) -> Result<Response, AppError> {
    let number = parse_ticket_number(&number)?;
    let ticket = state.ledger.complete(number).await?;
    Ok(success(ticket, "Ticket service finished"))
}

pub async fn list_tickets(State(state): State<AppState>) -> Result<Response, AppError> {
    let tickets = state.ledger.list_tickets().await?;
    let count = tickets.len();
    Ok(success(tickets, format!("{count} ticket(s)")))
}

fn parse_ticket_number(raw: &str) -> Result<i64, AppError> {
    match raw.parse::<i64>() {
        Ok(number) if number > 0 => Ok(number),
        _ => Err(AppError::ValidationError(format!(
            "Ticket number must be a positive integer, got '{raw}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ticket_number() {
        assert_eq!(parse_ticket_number("17").unwrap(), 17);
        assert!(matches!(
            parse_ticket_number("0"),
            Err(AppError::ValidationError(_))
        ));
        assert!(parse_ticket_number("-3").is_err());
        assert!(parse_ticket_number("abc").is_err());
        assert!(parse_ticket_number("99999999999999999999").is_err());
    }
}
