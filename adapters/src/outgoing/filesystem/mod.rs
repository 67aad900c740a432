pub mod image_source_fs;
