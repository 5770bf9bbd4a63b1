//! Built-in handlers for initialize, initialized, shutdown and exit.

use crate::method::{MethodDefinition, MethodDirection, MethodSet};
use crate::session::{CallContext, LifecycleState, PeerInfo};
use crate::types::*;

pub(crate) fn add_lifecycle_methods<C: Send + Sync + 'static>(set: &mut MethodSet<C>) {
    set.add(MethodDefinition::request(
        INITIALIZE_METHOD,
        MethodDirection::ClientToServer,
        process_initialize::<C>,
    ));
    set.add(MethodDefinition::notification(
        INITIALIZED_METHOD,
        MethodDirection::ClientToServer,
        process_initialized::<C>,
    ));
    set.add(MethodDefinition::request(
        SHUTDOWN_METHOD,
        MethodDirection::ClientToServer,
        process_shutdown::<C>,
    ));
    set.add(MethodDefinition::notification(
        EXIT_METHOD,
        MethodDirection::ClientToServer,
        process_exit::<C>,
    ));
}

async fn process_initialize<C>(
    call: CallContext<C>,
    _id: RequestId,
    params: InitializeParams,
) -> LspResult<Option<InitializeResult>> {
    let session = call.session();
    session.begin_initialize(PeerInfo::from(params))?;
    Ok(Some(session.initialize_result()))
}

async fn process_initialized<C>(call: CallContext<C>, _params: InitializedParams) -> LspResult<()> {
    let session = call.session();
    session.transition(
        LifecycleState::Initializing,
        LifecycleState::Initialized,
        || LspError::InternalError("Server is not initializing.".to_string()),
    )?;
    session.run_on_initialized();
    Ok(())
}

async fn process_shutdown<C>(
    call: CallContext<C>,
    _id: RequestId,
    _params: ShutdownParams,
) -> LspResult<Option<ShutdownResult>> {
    let session = call.session();
    session.transition(
        LifecycleState::Initialized,
        LifecycleState::Shutdown,
        || LspError::ServerNotInitialized,
    )?;
    session.run_on_shutdown();
    Ok(Some(Void {}))
}

async fn process_exit<C>(call: CallContext<C>, _params: ExitParams) -> LspResult<()> {
    let code = call.session().record_exit();
    if code != 0 {
        tracing::warn!("Exit received without a prior shutdown");
    }
    tracing::info!("Exit requested, exit code {code}");
    call.port().close();
    Ok(())
}
