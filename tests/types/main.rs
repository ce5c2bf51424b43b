mod catalog_page_test;
mod cursor_test;
