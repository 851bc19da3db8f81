use quill_database::{
    error::{BackendError, BackendResult},
    impls::QuillContext,
};
use serde::Deserialize;

#[derive(Deserialize)]
struct UploadedAsset {
    url: String,
}

/// Pushes a thumbnail to the external asset host and returns its public url.
/// Any failure here must abort the post create/update before a row is
/// written, so errors surface as UpstreamFailure instead of being retried.
pub(crate) async fn upload_thumbnail(
    file_name: &str,
    data: Vec<u8>,
    context: &QuillContext,
) -> BackendResult<String> {
    let mime = mime_guess::from_path(file_name).first_or_octet_stream();
    let part = reqwest::multipart::Part::bytes(data)
        .file_name(file_name.to_string())
        .mime_str(mime.as_ref())
        .map_err(|err| BackendError::UpstreamFailure(err.to_string()))?;
    let form = reqwest::multipart::Form::new().part("file", part);

    let response = context
        .client
        .post(&context.conf.assets.upload_url)
        .multipart(form)
        .send()
        .await?;
    let status = response.status();
    if !status.is_success() {
        return Err(BackendError::UpstreamFailure(format!(
            "asset host returned {status}"
        )));
    }
    let uploaded: UploadedAsset = response
        .json()
        .await
        .map_err(|err| BackendError::UpstreamFailure(err.to_string()))?;
    Ok(uploaded.url)
}
