mod helpers;
mod test_publish;
