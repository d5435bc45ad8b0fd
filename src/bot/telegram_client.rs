use crate::config::Config;
use crate::http_client;
use frankenstein::AllowedUpdate;
use frankenstein::ErrorResponse;
use frankenstein::GetUpdatesParams;
use frankenstein::SendMessageParams;
use frankenstein::TelegramApi;
use frankenstein::Update;
use isahc::prelude::*;
use isahc::HttpClient;
use isahc::Request;
use std::collections::VecDeque;
use std::sync::OnceLock;

static API: OnceLock<Api> = OnceLock::new();

pub fn api() -> &'static Api {
    API.get_or_init(Api::new)
}

/// Thin Telegram client over the shared HTTP client. The bot only needs
/// four methods: get_me, get_updates, send_message and
/// get_chat_administrators, all provided by the `TelegramApi` trait.
#[derive(Clone, Debug)]
pub struct Api {
    pub api_url: String,
    pub update_params: GetUpdatesParams,
    pub buffer: VecDeque<Update>,
    pub http_client: HttpClient,
}

#[derive(Debug)]
pub enum Error {
    Http { code: u16, message: String },
    Api(ErrorResponse),
}

impl Default for Api {
    fn default() -> Self {
        Self::new()
    }
}

impl Api {
    pub fn new() -> Api {
        let token = Config::telegram_bot_token();
        let base_url = Config::telegram_base_url();
        let api_url = format!("{base_url}{token}");

        let update_params = GetUpdatesParams::builder()
            .allowed_updates(vec![AllowedUpdate::Message, AllowedUpdate::ChannelPost])
            .build();

        Api {
            api_url,
            update_params,
            http_client: http_client::client().clone(),
            buffer: VecDeque::new(),
        }
    }

    pub fn next_update(&mut self) -> Option<Update> {
        if let Some(update) = self.buffer.pop_front() {
            return Some(update);
        }

        match self.get_updates(&self.update_params) {
            Ok(updates) => {
                for update in updates.result {
                    self.buffer.push_back(update);
                }

                if let Some(last_update) = self.buffer.back() {
                    self.update_params.offset = Some((last_update.update_id + 1).into());
                }

                self.buffer.pop_front()
            }

            Err(err) => {
                log::error!("Failed to fetch updates: {err:?}");
                None
            }
        }
    }

    pub fn send_text(&self, chat_id: i64, text: &str) -> Result<(), Error> {
        let params = SendMessageParams::builder()
            .chat_id(chat_id)
            .text(text)
            .build();

        match self.send_message(&params) {
            Ok(_) => Ok(()),
            Err(err) => {
                log::error!("Failed to send a message to chat {chat_id}: {err:?}");
                Err(err)
            }
        }
    }
}

impl From<isahc::http::Error> for Error {
    fn from(error: isahc::http::Error) -> Self {
        Error::Http {
            code: 500,
            message: format!("{error:?}"),
        }
    }
}

impl From<isahc::Error> for Error {
    fn from(error: isahc::Error) -> Self {
        Error::Http {
            code: 500,
            message: format!("{error:?}"),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::Http {
            code: 500,
            message: format!("{error:?}"),
        }
    }
}

impl TelegramApi for Api {
    type Error = Error;

    fn request<T1: serde::ser::Serialize, T2: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: Option<T1>,
    ) -> Result<T2, Error> {
        let url = format!("{}/{method}", self.api_url);

        let request_builder = Request::post(url).header("Content-Type", "application/json");

        let mut response = match params {
            None => {
                let request = request_builder.body(())?;
                self.http_client.send(request)?
            }
            Some(data) => {
                let json = serde_json::to_string(&data).map_err(|error| Error::Http {
                    code: 500,
                    message: format!("{error:?}"),
                })?;
                let request = request_builder.body(json)?;

                self.http_client.send(request)?
            }
        };

        let mut bytes = Vec::new();
        response.copy_to(&mut bytes)?;

        parse_response(&bytes)
    }

    // Multipart uploads are only needed for media messages, which this bot
    // never sends.
    fn request_with_form_data<T1: serde::ser::Serialize, T2: serde::de::DeserializeOwned>(
        &self,
        _method: &str,
        _params: T1,
        _files: Vec<(&str, std::path::PathBuf)>,
    ) -> Result<T2, Error> {
        Err(Error::Http {
            code: 500,
            message: "multipart requests are not supported".to_string(),
        })
    }
}

fn parse_response<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, Error> {
    match serde_json::from_slice(bytes) {
        Ok(result) => Ok(result),
        Err(serde_error) => match serde_json::from_slice::<ErrorResponse>(bytes) {
            Ok(error_response) => Err(Error::Api(error_response)),
            Err(_) => Err(Error::Http {
                code: 500,
                message: format!("{:?} {serde_error:?}", std::str::from_utf8(bytes)),
            }),
        },
    }
}
