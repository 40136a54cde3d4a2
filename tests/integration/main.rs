mod app_loop;
mod follow;
mod helpers;
mod jump;
mod pagination;
