use crate::models::db_operations::accounts_db_operations;
use crate::models::Account;
use crate::DbPool;
use actix_session::{Session, SessionExt};
use actix_web::{dev, error::ErrorUnauthorized, web, FromRequest, HttpRequest};
use std::future::{ready, Ready as StdReady};

const ACCOUNT_ID_KEY: &str = "account_id";

pub fn remember_identity(session: &Session, account: &Account) -> Result<(), actix_web::Error> {
    session
        .insert(ACCOUNT_ID_KEY, account.id)
        .map_err(actix_web::Error::from)
}

pub fn forget_identity(session: &Session) {
    session.clear();
}

/// The single identity-resolution seam: session claim -> account row.
/// The row is re-fetched on every call, so a session pointing at a deleted
/// account resolves to None rather than trusting the stale claim.
pub fn resolve_identity(session: &Session, pool: &DbPool) -> Option<Account> {
    let account_id = session.get::<i64>(ACCOUNT_ID_KEY).ok()??;
    let conn = pool.get().ok()?;
    accounts_db_operations::read_account_by_id(&conn, account_id)
}

pub struct AuthenticatedAccount(pub Account);

impl FromRequest for AuthenticatedAccount {
    type Error = actix_web::Error;
    type Future = StdReady<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let session = req.get_session();
        let resolved = req
            .app_data::<web::Data<DbPool>>()
            .and_then(|pool| resolve_identity(&session, pool));

        match resolved {
            Some(account) => ready(Ok(AuthenticatedAccount(account))),
            None => ready(Err(ErrorUnauthorized("Not logged in."))),
        }
    }
}
