//! # API Module
//!
//! Chat completion against an OpenAI compatible API.
//!
//! The client is created once per run with [`create_client`] and handed to [`ask`],
//! which sends a single prompt (optional system message plus one user message) and
//! returns the assistant's text.
//!
//! # Example
//!
//! ```no_run
//! use subtext_muse::api::{ask, create_client};
//! use subtext_muse::config::MuseConfig;
//! use subtext_muse::prompts::Prompt;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MuseConfig::default();
//! let client = create_client(&config)?;
//! let prompt = Prompt { system_prompt: None, user_message: "Hello".into() };
//! let answer = ask(&client, &config, &prompt).await?;
//! println!("{answer}");
//! # Ok(()) }
//! ```
use crate::{config::MuseConfig, prompts::Prompt};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
        ChatCompletionRequestUserMessageContent, CreateChatCompletionRequestArgs,
    },
};
use std::error::Error;

use tracing::debug;

/// Creates a new OpenAI API client from configuration.
///
/// The underlying HTTP client carries the configured request timeout.
pub fn create_client(config: &MuseConfig) -> Result<Client<OpenAIConfig>, Box<dyn Error>> {
    let openai_config = OpenAIConfig::new()
        .with_api_key(config.api_key.clone())
        .with_api_base(config.api_base.clone());
    debug!("Client created for {}", config.api_base);
    let http_client = reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()?;
    Ok(Client::with_config(openai_config).with_http_client(http_client))
}

/// Turn a [`Prompt`] into request messages: system first when present, then user.
pub fn prompt_messages(prompt: &Prompt) -> Vec<ChatCompletionRequestMessage> {
    let mut messages = Vec::with_capacity(2);
    if let Some(system_prompt) = &prompt.system_prompt {
        messages.push(ChatCompletionRequestMessage::System(
            ChatCompletionRequestSystemMessage {
                content: ChatCompletionRequestSystemMessageContent::Text(system_prompt.clone()),
                name: None,
            },
        ));
    }
    messages.push(ChatCompletionRequestMessage::User(
        ChatCompletionRequestUserMessage {
            content: ChatCompletionRequestUserMessageContent::Text(prompt.user_message.clone()),
            name: None,
        },
    ));
    messages
}

/// Send `prompt` and return the concatenated text of every returned choice.
///
/// # Errors
/// Request building, transport or API errors, or a response with no text.
#[allow(deprecated)]
pub async fn ask(
    client: &Client<OpenAIConfig>,
    config: &MuseConfig,
    prompt: &Prompt,
) -> Result<String, Box<dyn Error>> {
    let mut args = CreateChatCompletionRequestArgs::default();
    args.model(config.chat_model.clone())
        .messages(prompt_messages(prompt));
    if let Some(max_tokens) = config.max_tokens {
        args.max_tokens(max_tokens);
    }
    let request = args.build()?;

    debug!("Sending request: {:?}", request);
    let response = client.chat().create(request).await?;

    let mut response_string = String::new();
    for choice in response.choices {
        if let Some(content) = choice.message.content {
            response_string.push_str(&content);
        }
    }

    if response_string.is_empty() {
        return Err("No assistant response".into());
    }
    Ok(response_string)
}
