//! [`Command`] for authorizing a [`User`].

use derive_more::{Display, Error, From};
use jsonwebtoken::{Algorithm, Validation};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::User;
use crate::{
    domain::user::{session, Session},
    Service,
};

use super::Command;

/// [`Command`] for authorizing a [`User`].
///
/// [`User`]s are managed by an external identity service, so only the
/// [`Session`] token itself is verified.
#[derive(Clone, Debug, From)]
pub struct AuthorizeUserSession {
    /// [`Session`] token to authorize.
    pub token: session::Token,
}

impl<Db> Command<AuthorizeUserSession> for Service<Db> {
    type Ok = Session;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AuthorizeUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AuthorizeUserSession { token } = cmd;

        let session = jsonwebtoken::decode::<Session>(
            token.as_ref(),
            &self.config().jwt_decoding_key,
            &Validation::new(Algorithm::HS256),
        )
        .map_err(tracerr::from_and_wrap!(=> E))?
        .claims;

        Ok(session)
    }
}

/// Error of [`AuthorizeUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`jsonwebtoken`] decoding error.
    #[display("Failed to decode a JSON Web Token: {_0}")]
    JsonWebTokenDecodeError(jsonwebtoken::errors::Error),
}

#[cfg(test)]
mod spec {
    use common::DateTime;
    use jsonwebtoken::{EncodingKey, Header};

    use crate::{
        domain::user::{self, Session},
        Command as _, Service,
    };

    use super::{AuthorizeUserSession, ExecutionError};

    fn session(expires_in_secs: i64) -> Session {
        Session {
            user_id: user::Id::new(),
            expires_at: DateTime::from_unix_timestamp(
                DateTime::now().unix_timestamp() + expires_in_secs,
            )
            .unwrap()
            .coerce(),
        }
    }

    fn token(session: &Session, secret: &[u8]) -> String {
        jsonwebtoken::encode(
            &Header::default(),
            session,
            &EncodingKey::from_secret(secret),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn accepts_valid_token() {
        let session = session(3600);

        let authorized = Service::in_memory()
            .execute(AuthorizeUserSession {
                token: token(&session, Service::TEST_SECRET).parse().unwrap(),
            })
            .await
            .unwrap();

        assert_eq!(authorized.user_id, session.user_id);
    }

    #[tokio::test]
    async fn rejects_foreign_signature() {
        let err = Service::in_memory()
            .execute(AuthorizeUserSession {
                token: token(&session(3600), b"other").parse().unwrap(),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::JsonWebTokenDecodeError(_),
        ));
    }

    #[tokio::test]
    async fn rejects_expired_token() {
        assert!(Service::in_memory()
            .execute(AuthorizeUserSession {
                token: token(&session(-3600), Service::TEST_SECRET)
                    .parse()
                    .unwrap(),
            })
            .await
            .is_err());
    }
}
