//! Plain request/response endpoints: user, conversations, attachments, admin.

use std::path::Path;

use reqwest::{Method, Url};
use tracing::debug;

use crate::client::{AssistantClient, ClientError};
use crate::http::{FileUpload, RequestBody, Transport, TransportRequest, TransportResponse};
use crate::model::{AttachmentItem, Conversation, Items, Message, Messages, UploadedFile, UserInfo};

impl<T: Transport> AssistantClient<T> {
    async fn call(&self, method: Method, segments: &[&str]) -> Result<TransportResponse, ClientError> {
        let url = self.endpoint(segments)?;
        self.transport()
            .send(TransportRequest::new(method, url))
            .await?
            .error_for_status()
            .await
    }

    /// Current user, or `None` when the backend does not recognise the session.
    pub async fn get_user(&self) -> Result<Option<UserInfo>, ClientError> {
        let url = self.endpoint(&["user"])?;
        let response = self.transport().send(TransportRequest::new(Method::GET, url)).await?;
        if !response.is_success() {
            debug!(status = response.status, "no user for this session");
            return Ok(None);
        }
        Ok(Some(response.json().await?))
    }

    pub async fn list_conversations(&self) -> Result<Vec<Conversation>, ClientError> {
        let page: Items<Conversation> = self.call(Method::GET, &["conversations"]).await?.json().await?;
        Ok(page.items)
    }

    pub async fn delete_conversation(&self, conversation_id: &str) -> Result<(), ClientError> {
        self.call(Method::DELETE, &["conversations", conversation_id]).await?;
        Ok(())
    }

    /// Stored history of a conversation, oldest first.
    pub async fn conversation_messages(&self, conversation_id: &str) -> Result<Vec<Message>, ClientError> {
        let history: Messages = self
            .call(Method::GET, &["conversations", conversation_id, "messages"])
            .await?
            .json()
            .await?;
        Ok(history.messages)
    }

    pub async fn list_attachments(&self) -> Result<Vec<AttachmentItem>, ClientError> {
        let page: Items<AttachmentItem> = self.call(Method::GET, &["attachments"]).await?.json().await?;
        Ok(page.items)
    }

    /// URL serving the raw bytes of an attachment. No request is made.
    pub fn attachment_raw_url(&self, attachment_id: &str) -> Result<Url, ClientError> {
        self.endpoint(&["attachments", attachment_id, "raw"])
    }

    pub async fn delete_attachment(&self, attachment_id: &str) -> Result<(), ClientError> {
        self.call(Method::DELETE, &["attachments", attachment_id]).await?;
        Ok(())
    }

    /// Upload a file as multipart form field `file`.
    ///
    /// A success response without a JSON body yields an empty [`UploadedFile`].
    pub async fn upload_file(&self, file: FileUpload) -> Result<UploadedFile, ClientError> {
        let url = self.endpoint(&["upload"])?;
        debug!(file_name = %file.file_name, size = file.bytes.len(), "uploading file");

        let request = TransportRequest {
            method: Method::POST,
            url,
            body: RequestBody::Multipart(file),
        };
        let response = self.transport().send(request).await?.error_for_status().await?;

        if response.is_json() {
            response.json().await
        } else {
            Ok(UploadedFile::default())
        }
    }

    /// Read a file from disk and upload it under its own file name.
    pub async fn upload_path(
        &self,
        path: impl AsRef<Path>,
        content_type: Option<&str>,
    ) -> Result<UploadedFile, ClientError> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| ClientError::Config(format!("{} has no file name", path.display())))?;
        let bytes = tokio::fs::read(path).await?;

        let mut file = FileUpload::new(file_name, bytes);
        if let Some(content_type) = content_type {
            file = file.with_content_type(content_type);
        }
        self.upload_file(file).await
    }

    /// Ask the backend to re-ingest its document store.
    pub async fn reindex(&self) -> Result<(), ClientError> {
        self.call(Method::POST, &["admin", "ingest"]).await?;
        Ok(())
    }

    /// Ask the backend to reload its configuration.
    pub async fn reload(&self) -> Result<(), ClientError> {
        self.call(Method::POST, &["admin", "reload"]).await?;
        Ok(())
    }
}
