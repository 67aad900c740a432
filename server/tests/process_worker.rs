#![allow(clippy::unwrap_used, clippy::panic)]

use std::path::PathBuf;
use std::sync::Arc;

use domain::conversion::EncodeOptions;
use domain::image::{ImageFormat, PixelBuffer};
use toon_adapters::outgoing::image_rs::codec_image::{ImageCodecAdapter, ImageCodecConfig};
use toon_adapters::outgoing::worker_process::process_launcher::{
    ProcessWorkerConfig, ProcessWorkerLauncher,
};
use toon_application::conversion::error::ConversionError;
use toon_application::conversion::service::ConversionService;
use toon_application::error::AppError;
use toon_application::ports::outgoing::image_codec::ImageCodecPort;

fn service() -> ConversionService {
    ConversionService::new(Arc::new(ProcessWorkerLauncher::new(ProcessWorkerConfig {
        program: PathBuf::from(env!("CARGO_BIN_EXE_codec-worker")),
        args: Vec::new(),
    })))
}

#[tokio::test]
async fn decodes_and_encodes_in_worker_processes() {
    let service = service();
    let pixels = PixelBuffer::filled(6, 3, [1, 2, 3, 255]).unwrap();

    let png = service
        .encode(pixels.clone(), EncodeOptions::new(ImageFormat::Png))
        .await
        .unwrap();
    let decoded = service.decode(png.bytes).await.unwrap();

    assert_eq!(decoded, pixels);
}

#[tokio::test]
async fn empty_input_comes_back_as_codec_error() {
    match service().decode(Vec::new()).await {
        Err(AppError::Conversion(ConversionError::Codec { message })) => {
            assert_eq!(message, "Input buffer is empty");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn parallel_requests_use_separate_processes() {
    let service = service();
    let codec = ImageCodecAdapter::new(ImageCodecConfig::default());
    let a = codec
        .encode(
            &PixelBuffer::filled(2, 2, [9; 4]).unwrap(),
            EncodeOptions::new(ImageFormat::Png),
        )
        .unwrap();
    let b = codec
        .encode(
            &PixelBuffer::filled(5, 7, [9; 4]).unwrap(),
            EncodeOptions::new(ImageFormat::Webp),
        )
        .unwrap();

    let (first, second) = tokio::join!(service.decode(a.bytes), service.decode(b.bytes));

    assert_eq!(first.unwrap().dimensions(), (2, 2));
    assert_eq!(second.unwrap().dimensions(), (5, 7));
    assert_eq!(service.stats().in_flight, 0);
}
