pub mod file_server;
