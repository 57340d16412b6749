//! Ticket store — all SQL for the `tickets` table lives here.
//!
//! Equality lookup on `ticket_id` is the only access path. The append
//! operation is read-modify-write across two calls (fetch thread, then
//! update); two simultaneous replies to the same thread can race on the
//! history column. Accepted limitation at human email pace.

use mesa_core::models::ticket::Ticket;
use sqlx::PgPool;

/// The slice of a ticket row the append path needs.
#[derive(Debug, sqlx::FromRow)]
pub struct TicketThread {
    pub history: String,
    pub attachments: String,
}

/// Row values for a freshly created ticket.
#[derive(Debug)]
pub struct NewTicket {
    pub ticket_id: String,
    pub customer: String,
    pub subject: String,
    pub description: String,
    pub summary: String,
    pub category: String,
    pub priority: String,
    pub is_valid: bool,
    pub status: String,
    pub intent: String,
    pub missing_info: String,
    pub history: String,
    pub attachments: String,
    pub last_reply: String,
}

/// Field updates applied to an existing ticket on a follow-up message.
#[derive(Debug)]
pub struct TicketUpdate {
    pub history: String,
    pub status: String,
    pub attachments: String,
    pub last_reply: String,
}

pub async fn fetch_ticket_thread(
    pool: &PgPool,
    ticket_id: &str,
) -> Result<Option<TicketThread>, sqlx::Error> {
    sqlx::query_as("SELECT history, attachments FROM tickets WHERE ticket_id = $1")
        .bind(ticket_id)
        .fetch_optional(pool)
        .await
}

pub async fn fetch_ticket(pool: &PgPool, ticket_id: &str) -> Result<Option<Ticket>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM tickets WHERE ticket_id = $1")
        .bind(ticket_id)
        .fetch_optional(pool)
        .await
}

pub async fn insert_ticket(pool: &PgPool, ticket: &NewTicket) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO tickets
            (ticket_id, customer, subject, description, summary, category,
             priority, is_valid, status, intent, missing_info, history,
             attachments, last_reply)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
    )
    .bind(&ticket.ticket_id)
    .bind(&ticket.customer)
    .bind(&ticket.subject)
    .bind(&ticket.description)
    .bind(&ticket.summary)
    .bind(&ticket.category)
    .bind(&ticket.priority)
    .bind(ticket.is_valid)
    .bind(&ticket.status)
    .bind(&ticket.intent)
    .bind(&ticket.missing_info)
    .bind(&ticket.history)
    .bind(&ticket.attachments)
    .bind(&ticket.last_reply)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn append_ticket(
    pool: &PgPool,
    ticket_id: &str,
    update: &TicketUpdate,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE tickets
         SET history = $1, status = $2, attachments = $3, last_reply = $4,
             updated_at = now()
         WHERE ticket_id = $5",
    )
    .bind(&update.history)
    .bind(&update.status)
    .bind(&update.attachments)
    .bind(&update.last_reply)
    .bind(ticket_id)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn delete_ticket(pool: &PgPool, ticket_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM tickets WHERE ticket_id = $1")
        .bind(ticket_id)
        .execute(pool)
        .await?;

    Ok(())
}
