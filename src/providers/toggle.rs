use crate::{
    error::{Error, ErrorKind},
    store::{Edge, Store, ToggleState},
};

fn validate(edge: &Edge) -> Result<(), Error> {
    let valid = match edge {
        Edge::ListMovie { list_id, movie_id } => *list_id > 0 && !movie_id.trim().is_empty(),
        Edge::UserList { list_id, .. } => *list_id > 0,
        Edge::UserSeries { series_id, .. } => !series_id.trim().is_empty(),
    };

    if !valid {
        return Err(Error::InvalidInput(format!(
            "malformed {} key `{}`",
            edge.table(),
            edge.target_key()
        )));
    }

    Ok(())
}

/// Flips one membership edge and reports where it landed.
///
/// A uniqueness conflict means another session inserted the same edge
/// while we were deciding. The edge is re-read: if it is present now, the
/// caller's intent to turn it on already holds and `On` is reported.
/// Otherwise the conflict is returned. The write is never retried.
#[tracing::instrument(
    name = "toggle",
    skip_all,
    fields(table = edge.table(), owner = %edge.owner_key(), target = %edge.target_key())
)]
pub async fn toggle(store: &dyn Store, edge: &Edge) -> Result<ToggleState, Error> {
    validate(edge)?;

    let error = match store.toggle_membership(edge).await {
        Ok(state) => {
            tracing::debug!(state = ?state, "Toggled");
            return Ok(state);
        }
        Err(error) => error,
    };

    if ErrorKind::from(&error) != ErrorKind::Conflict {
        return Err(error);
    }

    tracing::warn!(err.msg = %error, "Toggle raced another session, re-reading");

    if store.membership_exists(edge).await? {
        return Ok(ToggleState::On);
    }

    Err(error)
}
