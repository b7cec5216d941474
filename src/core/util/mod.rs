pub mod retry_util;
