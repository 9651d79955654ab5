use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth, cart, catalog, consultations as consultation_dto, dashboard, orders as order_dto,
        payments as payment_dto, products, services, shops as shop_dto,
    },
    models::{
        Account, Booking, Brand, Cart, CartItem, Combo, ComboProduct, ConsultationCall,
        ConsultationRequest, CustomerInfo, Order, OrderItem, OrderPayment, PaymentCheckout, Product,
        ProductType, Service, ServiceReview, Shop,
    },
    response::{ApiResponse, Meta},
    routes::{
        bookings, brands, cart as cart_routes, combos, consultations, dashboard as dashboard_routes,
        health,
        orders, params, payments, product_types, products as product_routes, reviews,
        service_listings, shops, users,
    },
    status::{
        ApprovalStatus, AvailabilityType, BookingPaymentStatus, BookingStatus, CallResult,
        ComboType, ConsultationStatus, ConsultationType, OrderStatus, PaymentMethod, PaymentStatus,
        Role, ServiceAvailability, ServiceType,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        users::register,
        users::login,
        users::forgot_password,
        users::verify_code,
        users::reset_password,
        users::change_password,
        users::verify_email,
        users::update_profile,
        users::me,
        product_routes::list_products,
        product_routes::list_shop_products,
        product_routes::get_product,
        product_routes::create_product,
        product_routes::update_product,
        product_routes::delete_product,
        brands::list_brands,
        brands::get_brand,
        brands::create_brand,
        brands::update_brand,
        brands::delete_brand,
        product_types::list_product_types,
        product_types::get_product_type,
        product_types::create_product_type,
        product_types::update_product_type,
        product_types::delete_product_type,
        combos::list_combos,
        combos::get_combo,
        combos::create_combo,
        combos::update_combo,
        combos::delete_combo,
        cart_routes::get_cart,
        cart_routes::add_to_cart,
        cart_routes::update_quantity,
        cart_routes::remove_item,
        cart_routes::clear_cart,
        cart_routes::toggle_selected,
        orders::create_order,
        orders::list_orders,
        orders::list_customer_orders,
        orders::get_order,
        orders::update_order_status,
        orders::cancel_order,
        orders::create_payment,
        orders::payment_return,
        orders::payment_webhook,
        bookings::create_booking,
        bookings::list_bookings,
        bookings::list_customer_bookings,
        bookings::get_booking,
        bookings::update_booking_status,
        bookings::create_review,
        bookings::create_deposit_payment,
        bookings::payment_return,
        bookings::payment_webhook,
        service_listings::list_services,
        service_listings::list_shop_services,
        service_listings::get_service,
        service_listings::create_service,
        service_listings::update_service,
        service_listings::delete_service,
        service_listings::list_service_reviews,
        reviews::get_review,
        reviews::update_review,
        reviews::delete_review,
        shops::register_shop,
        shops::list_pending,
        shops::my_shop,
        shops::get_shop,
        shops::approve_shop,
        shops::reject_shop,
        shops::set_active,
        payments::create_package_payment,
        payments::payment_return,
        payments::payment_webhook,
        consultations::create_request,
        consultations::list_requests,
        consultations::get_request,
        consultations::reschedule,
        consultations::record_call,
        dashboard_routes::overview,
        dashboard_routes::users,
        dashboard_routes::shops,
        dashboard_routes::revenue
    ),
    components(
        schemas(
            Account,
            Shop,
            Brand,
            ProductType,
            Product,
            Combo,
            ComboProduct,
            Cart,
            CartItem,
            Order,
            OrderItem,
            CustomerInfo,
            OrderPayment,
            Service,
            Booking,
            ServiceReview,
            PaymentCheckout,
            ConsultationRequest,
            ConsultationCall,
            Role,
            OrderStatus,
            PaymentStatus,
            PaymentMethod,
            BookingStatus,
            BookingPaymentStatus,
            ApprovalStatus,
            AvailabilityType,
            ComboType,
            ServiceType,
            ServiceAvailability,
            ConsultationType,
            ConsultationStatus,
            CallResult,
            auth::RegisterRequest,
            auth::LoginRequest,
            auth::LoginResponse,
            auth::ForgotPasswordRequest,
            auth::VerifyCodeRequest,
            auth::ResetPasswordRequest,
            auth::ChangePasswordRequest,
            auth::UpdateProfileRequest,
            products::CreateProductRequest,
            products::UpdateProductRequest,
            products::ProductList,
            catalog::CreateBrandRequest,
            catalog::UpdateBrandRequest,
            catalog::BrandList,
            catalog::CreateProductTypeRequest,
            catalog::UpdateProductTypeRequest,
            catalog::ProductTypeList,
            catalog::CreateComboRequest,
            catalog::UpdateComboRequest,
            catalog::ComboList,
            cart::AddToCartRequest,
            cart::UpdateCartItemRequest,
            cart::SelectCartItemRequest,
            order_dto::CustomerInfoInput,
            order_dto::CreateOrderRequest,
            order_dto::UpdateOrderStatusRequest,
            order_dto::OrderList,
            services::CreateServiceRequest,
            services::UpdateServiceRequest,
            services::ServiceList,
            services::CreateBookingRequest,
            services::UpdateBookingStatusRequest,
            services::BookingPaymentRequest,
            services::BookingList,
            services::CreateReviewRequest,
            services::UpdateReviewRequest,
            services::ReviewList,
            shop_dto::RegisterShopRequest,
            shop_dto::ShopRegistration,
            shop_dto::RejectShopRequest,
            shop_dto::SetShopActiveRequest,
            shop_dto::ShopList,
            payment_dto::CreatePackagePaymentRequest,
            payment_dto::PaymentReturnQuery,
            payment_dto::ReconcileOutcome,
            payment_dto::WebhookAck,
            consultation_dto::CreateConsultationRequest,
            consultation_dto::RescheduleConsultationRequest,
            consultation_dto::RecordCallRequest,
            consultation_dto::ConsultationList,
            dashboard::DashboardQuery,
            dashboard::Overview,
            dashboard::UserStats,
            dashboard::ShopStats,
            dashboard::RevenueStats,
            params::Pagination,
            params::ProductQuery,
            params::ComboQuery,
            params::OrderListQuery,
            params::ServiceQuery,
            params::BookingQuery,
            params::ConsultationQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<products::ProductList>,
            ApiResponse<Order>,
            ApiResponse<order_dto::OrderList>,
            ApiResponse<Booking>,
            ApiResponse<PaymentCheckout>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Users", description = "Registration, login and account endpoints"),
        (name = "Products", description = "Product catalog endpoints"),
        (name = "Brands", description = "Brand endpoints"),
        (name = "Product Types", description = "Product type endpoints"),
        (name = "Combos", description = "Product bundle endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Order and order payment endpoints"),
        (name = "Bookings", description = "Service booking and deposit endpoints"),
        (name = "Services", description = "Shop service listing endpoints"),
        (name = "Reviews", description = "Service review endpoints"),
        (name = "Shops", description = "Shop registration and review endpoints"),
        (name = "Payments", description = "Shop package payment endpoints"),
        (name = "Consultations", description = "Call-back request queue endpoints"),
        (name = "Dashboard", description = "Admin statistics endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
