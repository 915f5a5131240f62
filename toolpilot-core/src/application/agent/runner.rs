use super::arguments;
use super::errors::{AgentError, ToolCallError};
use super::models::{LoopOutcome, LoopStatus};
use super::Agent;
use crate::application::catalog::ToolCatalog;
use crate::application::serializer::serialize;
use crate::constants::BUDGET_EXHAUSTED_MESSAGE;
use crate::domain::types::ToolCallRequest;
use crate::infrastructure::model::ModelProvider;
use crate::infrastructure::transport::ToolServer;
use serde_json::Value;
use toolpilot_session::{Conversation, Turn};
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

impl<P: ModelProvider> Agent<P> {
    /// Open a session, run the loop, close the session.
    pub async fn process_query(&self, query: &str) -> Result<LoopOutcome, AgentError> {
        let span = info_span!("query", id = %Uuid::new_v4());
        async move {
            info!(query, "Processing query");
            let server = self.connector.connect().await.map_err(|err| {
                error!(%err, "Failed to connect to tool server");
                AgentError::from(err)
            })?;
            let result = self.run(server.as_ref(), query).await;
            server.close().await;
            match &result {
                Ok(outcome) => info!(
                    status = ?outcome.status,
                    model_calls = outcome.model_calls,
                    "Query finished"
                ),
                Err(err) => error!(%err, "Query failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    /// Fetch the adapted catalog over a short-lived session.
    pub async fn tool_catalog(&self) -> Result<ToolCatalog, AgentError> {
        let server = self.connector.connect().await?;
        let listed = server.list_tools().await;
        server.close().await;
        Ok(ToolCatalog::adapt(listed?))
    }

    /// Run the loop over an already open session.
    pub async fn run(&self, server: &dyn ToolServer, query: &str) -> Result<LoopOutcome, AgentError> {
        let catalog = ToolCatalog::adapt(server.list_tools().await?);
        info!(tools = ?catalog.names().collect::<Vec<_>>(), "Loaded tools");

        let mut conversation = Conversation::new(query);
        let mut model_calls = 0;

        while model_calls < self.max_iterations {
            model_calls += 1;
            let reply = self
                .provider
                .ask(conversation.turns(), &catalog)
                .await
                .map_err(|err| {
                    error!(%err, "Model request failed");
                    AgentError::from(err)
                })?;
            debug!(
                step = model_calls,
                text_len = reply.text.len(),
                tool_calls = reply.tool_calls.len(),
                "Model replied"
            );

            if reply.has_text() {
                if !reply.tool_calls.is_empty() {
                    debug!(
                        ignored = reply.tool_calls.len(),
                        "Final text present, ignoring tool calls"
                    );
                }
                conversation.append(Turn::assistant(reply.text));
                self.persist(&conversation).await;
                return Ok(LoopOutcome::new(conversation, LoopStatus::Done, model_calls));
            }

            if reply.tool_calls.is_empty() {
                warn!(step = model_calls, "Model produced neither text nor tool calls");
                return Ok(LoopOutcome::new(conversation, LoopStatus::Idle, model_calls));
            }

            for call in &reply.tool_calls {
                let turn = self.execute(server, &catalog, call).await?;
                conversation.append(turn);
            }
            self.persist(&conversation).await;
        }

        warn!(
            max_iterations = self.max_iterations,
            "Iteration budget exhausted without a final answer"
        );
        conversation.append(Turn::assistant(BUDGET_EXHAUSTED_MESSAGE));
        self.persist(&conversation).await;
        Ok(LoopOutcome::new(
            conversation,
            LoopStatus::BudgetExhausted,
            model_calls,
        ))
    }

    /// Execute one call and turn the outcome into a conversation turn.
    ///
    /// Only transport failures that leave the session unusable escape.
    async fn execute(
        &self,
        server: &dyn ToolServer,
        catalog: &ToolCatalog,
        call: &ToolCallRequest,
    ) -> Result<Turn, AgentError> {
        match self.invoke(server, catalog, call).await {
            Ok(payload) => {
                info!(tool = %call.name, "Tool call succeeded");
                Ok(Turn::tool_result(&call.name, &payload))
            }
            Err(ToolCallError::Execution { source, .. }) if source.is_fatal() => {
                error!(tool = %call.name, err = %source, "Tool server connection lost");
                Err(AgentError::Connection(source))
            }
            Err(err) => {
                warn!(tool = %call.name, %err, "Tool call failed");
                Ok(Turn::tool_error(&call.name, err.to_string()))
            }
        }
    }

    async fn invoke(
        &self,
        server: &dyn ToolServer,
        catalog: &ToolCatalog,
        call: &ToolCallRequest,
    ) -> Result<Value, ToolCallError> {
        if !catalog.contains(&call.name) {
            return Err(ToolCallError::UnknownTool(call.name.clone()));
        }
        let arguments = arguments::parse(&call.name, &call.arguments)?;
        arguments::check_required(
            &call.name,
            &arguments,
            &catalog.required_arguments(&call.name),
        )?;

        let args = Value::Object(arguments);
        debug!(tool = %call.name, arguments = %args, "Calling tool");
        let result = server
            .call_tool(&call.name, args)
            .await
            .map_err(|source| ToolCallError::Execution {
                tool: call.name.clone(),
                source,
            })?;

        if result.is_error {
            let message = result
                .text()
                .unwrap_or_else(|| serialize(&result).to_string());
            return Err(ToolCallError::Reported {
                tool: call.name.clone(),
                message,
            });
        }

        Ok(match result.payload() {
            Some(payload) => serialize(payload),
            None => serialize(&result),
        })
    }

    async fn persist(&self, conversation: &Conversation) {
        if let Err(err) = self.logger.persist(&conversation.snapshot()).await {
            warn!(%err, "Failed to log conversation");
        }
    }
}
