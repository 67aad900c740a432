pub mod codec_image;
